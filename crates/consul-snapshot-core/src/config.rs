//! Run configuration
//!
//! The composition root fills these structs (from flags and environment) and
//! hands them to the pipelines; nothing in the library reads ambient process
//! state such as the hostname or environment variables.

use crate::error::{Error, Result};
use crate::security::Passphrase;
use camino::Utf8PathBuf;
use std::fmt;
use std::time::Duration;

/// Default remote key prefix
pub const DEFAULT_OBJECT_PREFIX: &str = "backups";

/// Default scratch directory
pub const DEFAULT_TMP_DIR: &str = "/tmp";

/// Default interval between scheduled backups, in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Server-side encryption directive that takes a KMS key id
pub const SSE_KMS: &str = "aws:kms";

/// Object storage backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Amazon S3 or an S3-compatible service
    S3,
    /// Google Cloud Storage
    Gcs,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::S3 => "s3",
            BackendKind::Gcs => "gcs",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bucket settings for the supported backends. At most one bucket may be set.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub s3_bucket: String,
    pub s3_region: String,
    /// Custom endpoint for S3-compatible services (MinIO, Ceph, ...)
    pub s3_endpoint: Option<String>,
    /// `AES256` or `aws:kms`
    pub s3_server_side_encryption: Option<String>,
    pub s3_kms_key_id: Option<String>,
    pub gcs_bucket: String,
}

impl StorageConfig {
    /// Returns the active backend, `None` if no bucket is configured.
    pub fn backend(&self) -> Result<Option<BackendKind>> {
        match (self.s3_bucket.is_empty(), self.gcs_bucket.is_empty()) {
            (false, false) => Err(Error::config(
                "both an S3 bucket and a GCS bucket are configured; choose one",
            )),
            (false, true) => Ok(Some(BackendKind::S3)),
            (true, false) => Ok(Some(BackendKind::Gcs)),
            (true, true) => Ok(None),
        }
    }

    /// Returns the bucket of the active backend.
    pub fn bucket(&self) -> Result<&str> {
        match self.backend()? {
            Some(BackendKind::S3) => Ok(&self.s3_bucket),
            Some(BackendKind::Gcs) => Ok(&self.gcs_bucket),
            None => Err(Error::config("no storage bucket configured")),
        }
    }
}

/// Configuration for a backup or restore run
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Node name recorded in metadata and used in archive names
    pub hostname: String,
    /// Local scratch directory for staging and downloads
    pub tmp_dir: Utf8PathBuf,
    /// Interval between scheduled backups
    pub interval: Duration,
    /// Encrypt archives when set
    pub passphrase: Option<Passphrase>,
    /// Remote key prefix
    pub object_prefix: String,
    /// Self-test mode: fixed local names, no remote transfer
    pub self_test: bool,
    /// Version string written into `meta.json`
    pub tool_version: String,
    pub storage: StorageConfig,
}

impl SnapshotConfig {
    /// Creates a configuration with defaults for everything but the hostname.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            tmp_dir: Utf8PathBuf::from(DEFAULT_TMP_DIR),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            passphrase: None,
            object_prefix: DEFAULT_OBJECT_PREFIX.to_string(),
            self_test: false,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageConfig::default(),
        }
    }

    pub fn with_tmp_dir(mut self, tmp_dir: impl Into<Utf8PathBuf>) -> Self {
        self.tmp_dir = tmp_dir.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the passphrase; an empty one disables encryption.
    pub fn with_passphrase(mut self, passphrase: Option<Passphrase>) -> Self {
        self.passphrase = passphrase.filter(|p| !p.is_empty());
        self
    }

    /// Sets the remote prefix; an empty one falls back to the default.
    pub fn with_object_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_matches('/');
        self.object_prefix = if trimmed.is_empty() {
            DEFAULT_OBJECT_PREFIX.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }

    pub fn with_self_test(mut self, self_test: bool) -> Self {
        self.self_test = self_test;
        self
    }

    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Rejects configurations that cannot produce a valid run.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::config("hostname must not be empty"));
        }

        if self.interval.is_zero() {
            return Err(Error::config("backup interval must be greater than zero"));
        }

        let backend = self.storage.backend()?;
        if backend.is_none() && !self.self_test {
            return Err(Error::config(
                "no storage bucket configured (set an S3 bucket and region, or a GCS bucket)",
            ));
        }

        if backend == Some(BackendKind::S3) && self.storage.s3_region.is_empty() {
            return Err(Error::config("an S3 bucket requires an S3 region"));
        }

        if backend == Some(BackendKind::Gcs)
            && self.storage.s3_server_side_encryption.is_some()
        {
            return Err(Error::config(
                "server-side encryption directives apply to S3 buckets only",
            ));
        }

        if self.storage.s3_kms_key_id.is_some()
            && self.storage.s3_server_side_encryption.as_deref() != Some(SSE_KMS)
        {
            return Err(Error::config(format!(
                "a KMS key id requires the {} server-side encryption directive",
                SSE_KMS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn s3_storage() -> StorageConfig {
        StorageConfig {
            s3_bucket: "snapshots".to_string(),
            s3_region: "us-east-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = SnapshotConfig::new("node-1");
        assert_eq!(config.object_prefix, "backups");
        assert_eq!(config.tmp_dir, Utf8PathBuf::from("/tmp"));
        assert_eq!(config.interval, Duration::from_secs(60));
        assert!(config.passphrase.is_none());
        assert!(!config.self_test);
    }

    #[test]
    fn test_backend_selection() {
        assert_eq!(s3_storage().backend().unwrap(), Some(BackendKind::S3));

        let gcs = StorageConfig {
            gcs_bucket: "snapshots".to_string(),
            ..Default::default()
        };
        assert_eq!(gcs.backend().unwrap(), Some(BackendKind::Gcs));
        assert_eq!(gcs.bucket().unwrap(), "snapshots");

        assert_eq!(StorageConfig::default().backend().unwrap(), None);
    }

    #[test]
    fn test_both_backends_is_a_config_error() {
        let storage = StorageConfig {
            gcs_bucket: "other".to_string(),
            ..s3_storage()
        };
        let err = storage.backend().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_missing_bucket_is_a_config_error() {
        let err = StorageConfig::default().bucket().unwrap_err();
        assert!(err.to_string().contains("no storage bucket"));

        let config = SnapshotConfig::new("node-1");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_self_test_needs_no_bucket() {
        let config = SnapshotConfig::new("node-1").with_self_test(true);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_s3_requires_region() {
        let storage = StorageConfig {
            s3_region: String::new(),
            ..s3_storage()
        };
        let config = SnapshotConfig::new("node-1").with_storage(storage);
        assert!(config.validate().is_err());

        let config = SnapshotConfig::new("node-1").with_storage(s3_storage());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_kms_key_requires_kms_directive() {
        let storage = StorageConfig {
            s3_server_side_encryption: Some("AES256".to_string()),
            s3_kms_key_id: Some("arn:aws:kms:key/1".to_string()),
            ..s3_storage()
        };
        let config = SnapshotConfig::new("node-1").with_storage(storage);
        assert!(config.validate().is_err());

        let storage = StorageConfig {
            s3_server_side_encryption: Some(SSE_KMS.to_string()),
            s3_kms_key_id: Some("arn:aws:kms:key/1".to_string()),
            ..s3_storage()
        };
        let config = SnapshotConfig::new("node-1").with_storage(storage);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sse_directive_requires_s3() {
        let storage = StorageConfig {
            gcs_bucket: "snapshots".to_string(),
            s3_server_side_encryption: Some(SSE_KMS.to_string()),
            ..Default::default()
        };
        let config = SnapshotConfig::new("node-1").with_storage(storage);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config = SnapshotConfig::new("node-1")
            .with_object_prefix("")
            .with_passphrase(Some(Passphrase::from("")));
        assert_eq!(config.object_prefix, DEFAULT_OBJECT_PREFIX);
        assert!(config.passphrase.is_none());

        let config = SnapshotConfig::new("node-1").with_object_prefix("/team/consul/");
        assert_eq!(config.object_prefix, "team/consul");
    }

    #[test]
    fn test_rejects_empty_hostname_and_zero_interval() {
        let config = SnapshotConfig::new(" ").with_self_test(true);
        assert!(config.validate().is_err());

        let config = SnapshotConfig::new("node-1")
            .with_self_test(true)
            .with_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
