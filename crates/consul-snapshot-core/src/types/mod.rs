//! Entity types captured by a snapshot

mod catalog;
mod kv;
mod meta;

pub use catalog::{AclEntry, PreparedQuery};
pub use kv::KvEntry;
pub use meta::{SnapshotMeta, META_FILENAME};

/// The full KV + prepared query + ACL state captured in one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub kv: Vec<KvEntry>,
    pub prepared_queries: Vec<PreparedQuery>,
    pub acls: Vec<AclEntry>,
}

impl Snapshot {
    /// Creates a snapshot holding only KV data (the legacy layout).
    pub fn kv_only(kv: Vec<KvEntry>) -> Self {
        Self {
            kv,
            ..Default::default()
        }
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.kv.is_empty() && self.prepared_queries.is_empty() && self.acls.is_empty()
    }
}
