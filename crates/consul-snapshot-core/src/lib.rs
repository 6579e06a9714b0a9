//! Core types for consul-snapshot
//!
//! Holds the entity types that make up a snapshot, run configuration, the
//! shared error type and the coordination-store client.

pub mod config;
pub mod error;
pub mod security;
pub mod store;
pub mod types;

pub use config::{BackendKind, SnapshotConfig, StorageConfig};
pub use error::{Error, ErrorCategory, Result};
pub use security::Passphrase;
pub use store::{ConsulClient, ConsulConfig, StoreClient, LAST_BACKUP_KEY};
pub use types::{AclEntry, KvEntry, PreparedQuery, Snapshot, SnapshotMeta};
