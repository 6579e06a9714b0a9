//! S3 backend
//!
//! Supports AWS S3 and S3-compatible storage (MinIO, Ceph, Wasabi).

use crate::RemoteStore;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use consul_snapshot_core::config::SSE_KMS;
use consul_snapshot_core::{Error, Result, StorageConfig};
use tracing::{debug, info};

const BACKEND: &str = "S3";

/// Server-side encryption settings applied to every upload
#[derive(Debug, Clone, Default, PartialEq)]
struct Sse {
    directive: Option<ServerSideEncryption>,
    kms_key_id: Option<String>,
}

impl Sse {
    fn from_config(storage: &StorageConfig) -> Self {
        let directive = storage
            .s3_server_side_encryption
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(ServerSideEncryption::from);

        // a key id is only meaningful with the KMS directive
        let kms_key_id = match storage.s3_server_side_encryption.as_deref() {
            Some(SSE_KMS) => storage.s3_kms_key_id.clone().filter(|k| !k.is_empty()),
            _ => None,
        };

        Self {
            directive,
            kms_key_id,
        }
    }
}

/// [`RemoteStore`] backed by Amazon S3
pub struct S3Store {
    client: Client,
    sse: Sse,
}

impl S3Store {
    /// Creates a client for the region and optional endpoint in `storage`.
    ///
    /// Credentials come from the default AWS provider chain.
    pub async fn new(storage: &StorageConfig) -> Result<Self> {
        if storage.s3_region.is_empty() {
            return Err(Error::config("an S3 bucket requires an S3 region"));
        }

        let client = Self::create_client(&storage.s3_region, storage.s3_endpoint.as_deref()).await;
        Ok(Self {
            client,
            sse: Sse::from_config(storage),
        })
    }

    async fn create_client(region: &str, endpoint: Option<&str>) -> Client {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(endpoint_url) = endpoint.filter(|e| !e.is_empty()) {
            debug!("Using custom S3 endpoint: {}", endpoint_url);
            builder = builder.endpoint_url(endpoint_url).force_path_style(true);
        }

        Client::from_conf(builder.build())
    }
}

#[async_trait]
impl RemoteStore for S3Store {
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let size = data.len();
        debug!("Uploading {} bytes: s3://{}/{}", size, bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type("application/octet-stream")
            .set_server_side_encryption(self.sse.directive.clone())
            .set_ssekms_key_id(self.sse.kms_key_id.clone())
            .send()
            .await
            .map_err(|e| {
                Error::remote(
                    BACKEND,
                    format!("upload of {} failed: {}", key, DisplayErrorContext(&e)),
                )
            })?;

        info!("Uploaded s3://{}/{} ({} bytes)", bucket, key, size);
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        debug!("Downloading s3://{}/{}", bucket, key);

        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    Error::remote(BACKEND, format!("object {} not found in {}", key, bucket))
                } else {
                    Error::remote(
                        BACKEND,
                        format!(
                            "download of {} failed: {}",
                            key,
                            DisplayErrorContext(&service_error)
                        ),
                    )
                }
            })?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| Error::remote(BACKEND, format!("reading {} failed: {}", key, e)))?;

        let data = body.into_bytes().to_vec();
        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), bucket, key);
        Ok(data)
    }

    fn name(&self) -> &'static str {
        BACKEND
    }
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("sse", &self.sse)
            .finish_non_exhaustive()
    }
}
