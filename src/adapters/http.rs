use crate::core::{ConfigProvider, RemoteCatalogSource, University};
use crate::utils::error::{CatalogError, Result};
use reqwest::Client;
use std::time::Duration;

/// `RemoteCatalogSource` over the public university search endpoint.
///
/// `GET {endpoint}` returns every record; `GET {endpoint}?country=X` returns
/// the records of one country. No retries; an optional client-wide timeout.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    endpoint: String,
}

impl HttpCatalogSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::with_timeout(
            config.api_endpoint(),
            config.request_timeout_seconds().map(Duration::from_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn search(&self, country: Option<&str>) -> Result<Vec<University>> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(country) = country {
            request = request.query(&[("country", country)]);
        }

        tracing::debug!("Making API request to: {} (country: {:?})", self.endpoint, country);
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let universities: Vec<University> = response.json().await?;
        tracing::debug!("Received {} universities", universities.len());
        Ok(universities)
    }
}

#[async_trait::async_trait]
impl RemoteCatalogSource for HttpCatalogSource {
    async fn fetch_all(&self) -> Result<Vec<University>> {
        self.search(None).await
    }

    async fn fetch_by_country(&self, country: &str) -> Result<Vec<University>> {
        self.search(Some(country)).await
    }
}
