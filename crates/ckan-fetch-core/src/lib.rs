//! ckan-fetch Core - Domain types, error handling, filtering and configuration.

pub mod config;
pub mod error;
pub mod filename;
pub mod filter;
pub mod models;
pub mod summary;

pub use config::{default_config_path, load_config, FileConfig, HttpConfig, DEFAULT_CKAN_URL};
pub use error::{AppError, ErrorKind};
pub use filter::ResourceFilter;
pub use models::{ApiKey, DatasetId, ResourceDescriptor};
pub use summary::{DownloadSummary, FailurePolicy, ResourceResult};
