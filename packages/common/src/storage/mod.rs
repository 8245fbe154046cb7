mod error;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod bucket;

use std::sync::Arc;

pub use error::StorageError;
pub use traits::{ObjectStore, PutOptions, validate_key};

use crate::config::{StorageBackendKind, StorageConfig};

/// Build the configured object store backend.
pub async fn build_object_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackendKind::Filesystem => {
            let store = filesystem::FilesystemObjectStore::new(
                config.filesystem_root.clone(),
                config.public_url.clone(),
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "object-storage")]
        StorageBackendKind::S3 => {
            let s3_config = config.s3.as_ref().ok_or_else(|| {
                StorageError::Config("storage.backend is \"s3\" but [storage.s3] is missing".into())
            })?;
            let store = bucket::S3ObjectStore::new(s3_config, config.public_url.clone())?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackendKind::S3 => Err(StorageError::Config(
            "S3 backend requires the `object-storage` feature".into(),
        )),
    }
}
