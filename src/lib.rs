pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::CatalogConfig;

pub use adapters::{HttpCatalogSource, JsonFileStore, MemoryStore};
pub use core::{catalog::CatalogStore, favorites::FavoritesStore};
pub use domain::model::{CountryFacet, FilterState, IdentityPolicy, LoadState, StoreWarning, University};
pub use utils::error::{CatalogError, Result};
