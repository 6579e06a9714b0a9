//! Object storage for consul-snapshot archives
//!
//! Archives are written under a date-partitioned key
//! (`<prefix>/<year>/<month>/<day>/<filename>`) to either Amazon S3 (or an
//! S3-compatible service) or Google Cloud Storage.

mod key;
mod object;
mod s3;

pub use key::remote_key;
pub use object::ObjectStoreRemote;
pub use s3::S3Store;

use async_trait::async_trait;
use consul_snapshot_core::{BackendKind, Result, StorageConfig};
use std::sync::Arc;

/// Upload and download of whole archives
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Uploads `data` to `bucket` under `key`, replacing any existing object
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()>;

    /// Downloads the object at `key` in `bucket`
    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Short backend name used in logs and errors
    fn name(&self) -> &'static str;
}

/// Builds the backend selected by `storage`, or `None` if no bucket is configured.
pub async fn from_config(storage: &StorageConfig) -> Result<Option<Arc<dyn RemoteStore>>> {
    let remote: Arc<dyn RemoteStore> = match storage.backend()? {
        Some(BackendKind::S3) => Arc::new(S3Store::new(storage).await?),
        Some(BackendKind::Gcs) => Arc::new(ObjectStoreRemote::gcs()),
        None => return Ok(None),
    };
    tracing::debug!("Using {} object storage", remote.name());
    Ok(Some(remote))
}
