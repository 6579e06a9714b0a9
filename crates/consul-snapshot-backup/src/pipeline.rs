//! Backup and restore orchestration.
//!
//! Each run owns the staging directory and archive it creates and removes
//! them on every exit path. Stages run strictly in sequence; any fatal error
//! ends the run and is returned to the caller.

use crate::archive;
use crate::collector::collect;
use crate::envelope;
use crate::layout::{archive_file_name, staging_dir_name};
use crate::restore::{self, Compatibility, RestoreReport, Restorer};
use crate::staging::{stage, RunInfo};
use camino::{Utf8Path, Utf8PathBuf};
use consul_snapshot_core::{
    Error, KvEntry, Result, SnapshotConfig, SnapshotMeta, StoreClient, LAST_BACKUP_KEY,
};
use consul_snapshot_remote::{remote_key, RemoteStore};
use std::fs;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scratch names inside a restore work directory; independent of the key
const DOWNLOAD_FILE_NAME: &str = "download";
const DECRYPTED_FILE_NAME: &str = "decrypted";
const EXTRACT_DIR_NAME: &str = "extracted";

/// Result of a successful backup run
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    /// Local archive path; only still present in self-test mode
    pub archive_path: Utf8PathBuf,
    /// Object key the archive was uploaded to, `None` in self-test mode
    pub remote_key: Option<String>,
    pub size_bytes: u64,
    pub encrypted: bool,
    pub meta: SnapshotMeta,
}

/// Collect, stage, archive, encrypt, upload.
pub struct BackupPipeline {
    config: SnapshotConfig,
    store: Arc<dyn StoreClient>,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl BackupPipeline {
    /// Validates `config` up front so misconfiguration fails before any I/O.
    pub fn new(
        config: SnapshotConfig,
        store: Arc<dyn StoreClient>,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Result<Self> {
        validate(&config, remote.is_some())?;
        Ok(Self {
            config,
            store,
            remote,
        })
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Runs one backup stamped with the current time.
    pub async fn run(&self) -> Result<BackupOutcome> {
        self.run_at(chrono::Utc::now().timestamp()).await
    }

    /// Runs one backup stamped with `start` (Unix seconds).
    pub async fn run_at(&self, start: i64) -> Result<BackupOutcome> {
        let began = Instant::now();
        let self_test = self.config.self_test;
        let staging_name = staging_dir_name(&self.config.hostname, start, self_test);
        let staging_path = self.config.tmp_dir.join(&staging_name);
        let archive_path = self
            .config
            .tmp_dir
            .join(archive_file_name(&self.config.hostname, start, self_test));

        info!("Starting backup run {}", start);
        let result = self.execute(start, &staging_name, &archive_path).await;

        remove_quietly(&staging_path);
        if !self_test || result.is_err() {
            remove_quietly(&archive_path);
        }

        match &result {
            Ok(outcome) => info!(
                "Backup complete: {} bytes{} in {:.1}s",
                outcome.size_bytes,
                outcome
                    .remote_key
                    .as_deref()
                    .map(|k| format!(" uploaded to {}", k))
                    .unwrap_or_default(),
                began.elapsed().as_secs_f64()
            ),
            Err(e) => warn!("Backup run {} failed: {}", start, e),
        }
        result
    }

    async fn execute(
        &self,
        start: i64,
        staging_name: &str,
        archive_path: &Utf8Path,
    ) -> Result<BackupOutcome> {
        info!("Stage 1/5: Collecting store state");
        let snapshot = collect(self.store.as_ref()).await?;

        info!("Stage 2/5: Staging snapshot");
        let run = RunInfo {
            tool_version: self.config.tool_version.clone(),
            node_name: self.config.hostname.clone(),
            start_time: start,
        };
        let staged = stage(&self.config.tmp_dir, staging_name, &snapshot, &run)?;

        info!("Stage 3/5: Compressing archive");
        let mut size_bytes = archive::compress(&staged.path, archive_path)?;

        let encrypted = match &self.config.passphrase {
            Some(passphrase) => {
                info!("Stage 4/5: Encrypting archive");
                let sealed = envelope::encrypt(&fs::read(archive_path)?, passphrase)?;
                fs::write(archive_path, &sealed)?;
                size_bytes = sealed.len() as u64;
                true
            }
            None => {
                debug!("Stage 4/5: No passphrase configured, archive left unencrypted");
                false
            }
        };

        if self.config.self_test {
            info!(
                "Stage 5/5: Self-test mode, keeping {} and skipping upload",
                archive_path
            );
            return Ok(BackupOutcome {
                archive_path: archive_path.to_path_buf(),
                remote_key: None,
                size_bytes,
                encrypted,
                meta: staged.meta,
            });
        }

        info!("Stage 5/5: Uploading archive");
        let remote = self.remote()?;
        let bucket = self.config.storage.bucket()?;
        let file_name = archive_path
            .file_name()
            .ok_or_else(|| Error::format(format!("invalid archive path {}", archive_path)))?;
        let key = remote_key(&self.config.object_prefix, start, file_name)?;

        remote.upload(bucket, &key, fs::read(archive_path)?).await?;

        self.store
            .put_kv(&KvEntry::new(LAST_BACKUP_KEY, start.to_string()))
            .await?;
        debug!("Recorded last backup time {}", start);

        Ok(BackupOutcome {
            archive_path: archive_path.to_path_buf(),
            remote_key: Some(key),
            size_bytes,
            encrypted,
            meta: staged.meta,
        })
    }

    fn remote(&self) -> Result<&Arc<dyn RemoteStore>> {
        self.remote
            .as_ref()
            .ok_or_else(|| Error::config("no storage backend configured"))
    }
}

/// Fetch, decrypt, extract, inspect, load, replay.
pub struct RestorePipeline {
    config: SnapshotConfig,
    store: Arc<dyn StoreClient>,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl RestorePipeline {
    pub fn new(
        config: SnapshotConfig,
        store: Arc<dyn StoreClient>,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Result<Self> {
        validate(&config, remote.is_some())?;
        Ok(Self {
            config,
            store,
            remote,
        })
    }

    /// Restores the archive at `key`. In self-test mode the local self-test
    /// archive is used instead and `key` is ignored.
    ///
    /// Returns [`Error::PartialRestore`] if some keys could not be written.
    pub async fn run(&self, key: &str) -> Result<RestoreReport> {
        let began = Instant::now();
        fs::create_dir_all(&self.config.tmp_dir)?;
        let workdir = tempfile::Builder::new()
            .prefix("consul-snapshot-restore.")
            .tempdir_in(&self.config.tmp_dir)?;
        let work = Utf8PathBuf::from_path_buf(workdir.path().to_path_buf()).map_err(|p| {
            Error::config(format!("scratch directory {} is not UTF-8", p.display()))
        })?;

        let result = self.execute(key, &work).await;

        if let Err(e) = workdir.close() {
            warn!("Unable to remove restore scratch directory {}: {}", work, e);
        }

        match &result {
            Ok(report) => info!(
                "Restore complete: {} keys restored in {:.1}s",
                report.kv_restored,
                began.elapsed().as_secs_f64()
            ),
            Err(e) => warn!("Restore failed: {}", e),
        }
        result
    }

    async fn execute(&self, key: &str, work: &Utf8Path) -> Result<RestoreReport> {
        info!("Stage 1/5: Fetching archive");
        let mut archive_path = self.fetch(key, work).await?;

        if envelope::is_encrypted(&archive_path)? {
            info!("Stage 2/5: Encrypted archive detected, decrypting");
            let passphrase = self.config.passphrase.as_ref().ok_or_else(|| {
                Error::config("archive is encrypted but no passphrase is configured")
            })?;
            let plain = envelope::decrypt(&fs::read(&archive_path)?, passphrase)?;
            let decrypted = work.join(DECRYPTED_FILE_NAME);
            fs::write(&decrypted, plain)?;
            archive_path = decrypted;
        } else {
            debug!("Stage 2/5: Archive is not encrypted");
        }

        info!("Stage 3/5: Extracting archive");
        let extract_dir = work.join(EXTRACT_DIR_NAME);
        fs::create_dir_all(&extract_dir)?;
        let extracted = archive::extract(&archive_path, &extract_dir)?;

        info!("Stage 4/5: Inspecting and loading archive");
        let version = restore::inspect(&extracted)?;
        if let restore::ArchiveVersion::Current { meta, .. } = &version {
            let compatibility = Compatibility::check(&meta.tool_version, &self.config.tool_version);
            if !compatibility.is_compatible() {
                warn!("{}; continuing restore", compatibility.message());
            }
        }
        let snapshot = restore::load(&version)?;

        info!("Stage 5/5: Restoring to store");
        Restorer::new(self.store.as_ref())
            .restore(&snapshot)
            .await
            .into_result()
    }

    /// Places the archive on local disk and returns its path.
    async fn fetch(&self, key: &str, work: &Utf8Path) -> Result<Utf8PathBuf> {
        if self.config.self_test {
            let local = self
                .config
                .tmp_dir
                .join(archive_file_name(&self.config.hostname, 0, true));
            info!("Self-test mode, restoring from {}", local);
            if !local.is_file() {
                return Err(Error::config(format!("self-test archive {} not found", local)));
            }
            return Ok(local);
        }

        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| Error::config("no storage backend configured"))?;
        let bucket = self.config.storage.bucket()?;

        let key = key.trim_start_matches('/');
        if key.is_empty() || key.ends_with('/') {
            return Err(Error::config(format!("{:?} is not a valid archive key", key)));
        }

        info!("Downloading {} from {} bucket {}", key, remote.name(), bucket);
        let data = remote.download(bucket, key).await?;
        let local = work.join(DOWNLOAD_FILE_NAME);
        fs::write(&local, &data)?;
        debug!("Downloaded {} bytes to {}", data.len(), local);
        Ok(local)
    }
}

fn validate(config: &SnapshotConfig, has_remote: bool) -> Result<()> {
    config.validate()?;
    if !config.self_test && !has_remote {
        return Err(Error::config("no storage backend configured"));
    }
    Ok(())
}

/// Best-effort removal of a run artifact.
fn remove_quietly(path: &Utf8Path) {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => debug!("Removed {}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Unable to remove {}: {}", path, e),
    }
}
