//! Buckets served through the `object_store` crate (GCS, in-memory)

use crate::RemoteStore;
use async_trait::async_trait;
use consul_snapshot_core::{Error, Result};
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

type StoreFactory = dyn Fn(&str) -> object_store::Result<Arc<dyn ObjectStore>> + Send + Sync;

/// [`RemoteStore`] over any `object_store` backend.
///
/// One store is opened per bucket on first use and reused afterwards.
pub struct ObjectStoreRemote {
    name: &'static str,
    factory: Box<StoreFactory>,
    buckets: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreRemote {
    pub fn new<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn(&str) -> object_store::Result<Arc<dyn ObjectStore>> + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Box::new(factory),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Google Cloud Storage, with credentials taken from the environment
    /// (`GOOGLE_APPLICATION_CREDENTIALS`, `GOOGLE_SERVICE_ACCOUNT`, ...).
    pub fn gcs() -> Self {
        Self::new("GCS", |bucket| {
            let store = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()?;
            Ok(Arc::new(store))
        })
    }

    /// Process-local buckets, for self-tests and unit tests
    pub fn in_memory() -> Self {
        Self::new("memory", |_| Ok(Arc::new(object_store::memory::InMemory::new())))
    }

    fn bucket(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| Error::remote(self.name, "bucket cache poisoned"))?;

        if let Some(store) = buckets.get(bucket) {
            return Ok(Arc::clone(store));
        }

        debug!("Opening {} bucket {}", self.name, bucket);
        let store = (self.factory)(bucket)
            .map_err(|e| Error::remote(self.name, format!("bucket {}: {}", bucket, e)))?;
        buckets.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

#[async_trait]
impl RemoteStore for ObjectStoreRemote {
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let store = self.bucket(bucket)?;
        let size = data.len();
        debug!("Uploading {} bytes to {}://{}/{}", size, self.name, bucket, key);

        store
            .put(&Path::from(key), PutPayload::from(data))
            .await
            .map_err(|e| Error::remote(self.name, format!("upload of {} failed: {}", key, e)))?;

        info!("Uploaded {}://{}/{} ({} bytes)", self.name, bucket, key, size);
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let store = self.bucket(bucket)?;
        debug!("Downloading {}://{}/{}", self.name, bucket, key);

        let result = store.get(&Path::from(key)).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                Error::remote(self.name, format!("object {} not found in {}", key, bucket))
            }
            e => Error::remote(self.name, format!("download of {} failed: {}", key, e)),
        })?;

        let data = result
            .bytes()
            .await
            .map_err(|e| Error::remote(self.name, format!("reading {} failed: {}", key, e)))?;

        debug!("Downloaded {} bytes", data.len());
        Ok(data.to_vec())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for ObjectStoreRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreRemote")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
