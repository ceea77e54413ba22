mod error;
mod path;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StorageError;
pub use path::{validate_blob_path, validate_blob_prefix};
pub use traits::{BlobInfo, BlobStore, BoxReader};
