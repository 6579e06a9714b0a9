//! consul-snapshot backup and restore
//!
//! A backup run collects KV, prepared query and ACL state from the store,
//! stages it as JSON with a `meta.json` record, packs it into a tar.gz,
//! optionally seals it in a passphrase envelope and uploads it. A restore
//! run reverses that, also accepting the older metadata-less layout (a bare
//! gzip of one KV array).
//!
//! ```no_run
//! use consul_snapshot_backup::BackupPipeline;
//! use consul_snapshot_core::{ConsulClient, ConsulConfig, SnapshotConfig, StorageConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> consul_snapshot_core::Result<()> {
//! let storage = StorageConfig {
//!     gcs_bucket: "consul-backups".to_string(),
//!     ..Default::default()
//! };
//! let config = SnapshotConfig::new("node1").with_storage(storage.clone());
//! let store = Arc::new(ConsulClient::new(&ConsulConfig::default())?);
//! let remote = consul_snapshot_remote::from_config(&storage).await?;
//!
//! let outcome = BackupPipeline::new(config, store, remote)?.run().await?;
//! println!("uploaded to {:?}", outcome.remote_key);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod checksum;
pub mod collector;
pub mod envelope;
pub mod layout;
pub mod pipeline;
pub mod restore;
pub mod serializer;
pub mod staging;

pub use archive::Extracted;
pub use collector::collect;
pub use layout::EntityKind;
pub use pipeline::{BackupOutcome, BackupPipeline, RestorePipeline};
pub use restore::{ArchiveVersion, RestoreReport, Restorer};
pub use staging::{RunInfo, StagingDir};
