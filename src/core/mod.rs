pub mod catalog;
pub mod collate;
pub mod favorites;
pub mod filter;
pub mod write_queue;

pub use crate::domain::model::{
    CountryFacet, FilterState, IdentityPolicy, LoadState, StoreWarning, University,
};
pub use crate::domain::ports::{ConfigProvider, RemoteCatalogSource, SelectionPersistence};
pub use crate::utils::error::Result;
