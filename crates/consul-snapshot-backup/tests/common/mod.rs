//! Common test helpers for consul-snapshot-backup integration tests
//!
//! - `MemoryStore`: an in-memory `StoreClient` with switchable failures
//! - `MemoryRemote`: an in-memory `RemoteStore` keyed by bucket and key
//! - config fixture builders

#![allow(dead_code)]

use async_trait::async_trait;
use camino::Utf8PathBuf;
use consul_snapshot_core::{
    AclEntry, Error, KvEntry, PreparedQuery, Result, SnapshotConfig, StorageConfig, StoreClient,
};
use consul_snapshot_remote::RemoteStore;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use tempfile::TempDir;

pub const BUCKET: &str = "consul-backups";
pub const HOST: &str = "node1";
/// 2016-03-05T00:00:00Z
pub const START: i64 = 1457136000;

// ─── Store fake ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    kv: Mutex<BTreeMap<String, KvEntry>>,
    prepared_queries: Mutex<Vec<PreparedQuery>>,
    acls: Mutex<Vec<AclEntry>>,
    acl_disabled: bool,
    fail_kv_listing: bool,
    failing_keys: HashSet<String>,
    put_attempts: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kv(self, key: &str, value: &str) -> Self {
        self.kv
            .lock()
            .unwrap()
            .insert(key.to_string(), KvEntry::new(key, value));
        self
    }

    pub fn with_entry(self, entry: KvEntry) -> Self {
        self.kv.lock().unwrap().insert(entry.key.clone(), entry);
        self
    }

    pub fn with_prepared_query(self, query: PreparedQuery) -> Self {
        self.prepared_queries.lock().unwrap().push(query);
        self
    }

    pub fn with_acl(self, acl: AclEntry) -> Self {
        self.acls.lock().unwrap().push(acl);
        self
    }

    pub fn with_acl_disabled(mut self) -> Self {
        self.acl_disabled = true;
        self
    }

    pub fn with_failing_kv_listing(mut self) -> Self {
        self.fail_kv_listing = true;
        self
    }

    /// Puts of these keys fail.
    pub fn with_failing_keys(mut self, keys: &[&str]) -> Self {
        self.failing_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn keys(&self) -> Vec<String> {
        self.kv.lock().unwrap().keys().cloned().collect()
    }

    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.kv.lock().unwrap().get(key).map(|e| e.value.clone())
    }

    /// Every stored entry, ordered by key.
    pub fn entries(&self) -> Vec<KvEntry> {
        self.kv.lock().unwrap().values().cloned().collect()
    }

    pub fn put_attempts(&self) -> Vec<String> {
        self.put_attempts.lock().unwrap().clone()
    }

    pub fn prepared_query_count(&self) -> usize {
        self.prepared_queries.lock().unwrap().len()
    }

    pub fn acl_count(&self) -> usize {
        self.acls.lock().unwrap().len()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn list_kv(&self) -> Result<Vec<KvEntry>> {
        if self.fail_kv_listing {
            return Err(Error::store("connection refused"));
        }
        Ok(self.kv.lock().unwrap().values().cloned().collect())
    }

    async fn get_kv(&self, key: &str) -> Result<Option<KvEntry>> {
        Ok(self.kv.lock().unwrap().get(key).cloned())
    }

    async fn put_kv(&self, entry: &KvEntry) -> Result<()> {
        self.put_attempts.lock().unwrap().push(entry.key.clone());
        if self.failing_keys.contains(&entry.key) {
            return Err(Error::store(format!("writing key {}: 500", entry.key)));
        }
        self.kv
            .lock()
            .unwrap()
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn list_prepared_queries(&self) -> Result<Vec<PreparedQuery>> {
        Ok(self.prepared_queries.lock().unwrap().clone())
    }

    async fn create_prepared_query(&self, query: &PreparedQuery) -> Result<()> {
        self.prepared_queries.lock().unwrap().push(query.clone());
        Ok(())
    }

    async fn list_acls(&self) -> Result<Vec<AclEntry>> {
        if self.acl_disabled {
            return Err(Error::AclSupportDisabled);
        }
        Ok(self.acls.lock().unwrap().clone())
    }

    async fn create_acl(&self, acl: &AclEntry) -> Result<()> {
        self.acls.lock().unwrap().push(acl.clone());
        Ok(())
    }
}

// ─── Remote fake ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryRemote {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(BUCKET.to_string(), key.to_string()))
            .cloned()
    }

    pub fn insert(&self, key: &str, data: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert((BUCKET.to_string(), key.to_string()), data);
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn upload(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::remote("memory", format!("object {} not found", key)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// A scratch directory and its UTF-8 path.
pub fn scratch() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}

/// Configuration for node1 writing to the in-memory bucket.
pub fn config(tmp_dir: &Utf8PathBuf) -> SnapshotConfig {
    SnapshotConfig::new(HOST)
        .with_tmp_dir(tmp_dir.clone())
        .with_tool_version("0.3.0")
        .with_storage(StorageConfig {
            gcs_bucket: BUCKET.to_string(),
            ..Default::default()
        })
}

/// Names of the entries left in a directory.
pub fn dir_entries(path: &Utf8PathBuf) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
