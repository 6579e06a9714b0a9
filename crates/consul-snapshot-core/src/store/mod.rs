//! Coordination store capability

mod consul;

pub use consul::{ConsulClient, ConsulConfig, DEFAULT_CONSUL_ADDR};

use crate::error::Result;
use crate::types::{AclEntry, KvEntry, PreparedQuery};
use async_trait::async_trait;

/// Key holding the start timestamp of the last successful backup
pub const LAST_BACKUP_KEY: &str = "service/consul-snapshot/lastbackup";

/// Operations the snapshot pipeline needs from the coordination store.
///
/// `list_acls` returns [`Error::AclSupportDisabled`](crate::Error::AclSupportDisabled)
/// when the cluster runs without ACLs; callers decide what that means.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Lists every key in the KV tree
    async fn list_kv(&self) -> Result<Vec<KvEntry>>;

    /// Reads a single key, `None` if absent
    async fn get_kv(&self, key: &str) -> Result<Option<KvEntry>>;

    /// Writes a single key
    async fn put_kv(&self, entry: &KvEntry) -> Result<()>;

    /// Lists prepared query definitions
    async fn list_prepared_queries(&self) -> Result<Vec<PreparedQuery>>;

    /// Creates a prepared query
    async fn create_prepared_query(&self, query: &PreparedQuery) -> Result<()>;

    /// Lists ACL entries
    async fn list_acls(&self) -> Result<Vec<AclEntry>>;

    /// Creates an ACL entry
    async fn create_acl(&self, acl: &AclEntry) -> Result<()>;
}
