//! CLI command implementations

pub mod backup;
pub mod restore;
pub mod version;

use crate::cli::SettingsArgs;
use crate::version::VersionInfo;
use anyhow::{Context, Result};
use consul_snapshot_core::{
    ConsulClient, ConsulConfig, Passphrase, SnapshotConfig, StorageConfig, StoreClient,
};
use consul_snapshot_remote::RemoteStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Everything a backup or restore run needs, resolved once per process
pub struct Runtime {
    pub config: SnapshotConfig,
    pub store: Arc<dyn StoreClient>,
    pub remote: Option<Arc<dyn RemoteStore>>,
}

impl Runtime {
    pub async fn from_settings(settings: &SettingsArgs, interval: Duration) -> Result<Self> {
        let hostname = resolve_hostname(settings.hostname.as_deref())?;
        let config = snapshot_config(settings, hostname, interval);
        config.validate()?;
        debug!("Resolved configuration: {:?}", config);

        let store: Arc<dyn StoreClient> = Arc::new(ConsulClient::new(&consul_config(settings))?);
        let remote = consul_snapshot_remote::from_config(&config.storage)
            .await
            .context("Failed to set up object storage")?;

        Ok(Self {
            config,
            store,
            remote,
        })
    }
}

fn resolve_hostname(explicit: Option<&str>) -> Result<String> {
    if let Some(name) = explicit.filter(|n| !n.trim().is_empty()) {
        return Ok(name.to_string());
    }
    let name = hostname::get().context("Failed to determine hostname")?;
    name.into_string()
        .map_err(|raw| anyhow::anyhow!("hostname {:?} is not valid UTF-8", raw))
}

pub(crate) fn snapshot_config(
    settings: &SettingsArgs,
    hostname: String,
    interval: Duration,
) -> SnapshotConfig {
    let storage = StorageConfig {
        s3_bucket: settings.s3_bucket.clone(),
        s3_region: settings.s3_region.clone(),
        s3_endpoint: non_empty(&settings.s3_endpoint),
        s3_server_side_encryption: non_empty(&settings.s3_sse),
        s3_kms_key_id: non_empty(&settings.s3_sse_kms_key_id),
        gcs_bucket: settings.gcs_bucket.clone(),
    };

    SnapshotConfig::new(hostname)
        .with_tmp_dir(settings.tmp_dir.clone())
        .with_interval(interval)
        .with_passphrase(settings.passphrase.clone().map(Passphrase::from))
        .with_object_prefix(settings.prefix.clone())
        .with_self_test(settings.self_test)
        .with_tool_version(VersionInfo::current().version)
        .with_storage(storage)
}

pub(crate) fn consul_config(settings: &SettingsArgs) -> ConsulConfig {
    ConsulConfig {
        address: settings.consul_addr.clone(),
        token: non_empty(&settings.consul_token),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}
