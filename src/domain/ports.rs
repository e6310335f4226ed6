use crate::domain::model::University;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read-only access to the remote university directory.
#[async_trait]
pub trait RemoteCatalogSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<University>>;
    async fn fetch_by_country(&self, country: &str) -> Result<Vec<University>>;
}

/// Durable string key-value store for user selections.
#[async_trait]
pub trait SelectionPersistence: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Settings the adapters and stores are built from.
pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn request_timeout_seconds(&self) -> Option<u64>;
    fn storage_path(&self) -> &str;
    fn country_key(&self) -> &str;
    fn favorites_key(&self) -> &str;
}
