pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod remote;

pub use api::{ApiClient, ScanTarget};
pub use cache::{CacheEntry, MediaCache, MediaHandle, MediaSource};
pub use error::ClientError;
