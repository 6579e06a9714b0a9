//! CLI argument parsing with clap
//!
//! Every setting falls back to the environment variable the tool has always
//! read, so container deployments keep working without flags.

use camino::Utf8PathBuf;
use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use consul_snapshot_core::config::{DEFAULT_INTERVAL_SECS, DEFAULT_OBJECT_PREFIX, DEFAULT_TMP_DIR};
use consul_snapshot_core::store::DEFAULT_CONSUL_ADDR;
use std::net::SocketAddr;

/// consul-snapshot - Consul KV, prepared query and ACL backups
#[derive(Parser, Debug)]
#[command(name = "consul-snapshot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Take backups, once or on an interval
    Backup(BackupArgs),

    /// Restore a backup into Consul
    Restore(RestoreArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Take a single backup and exit
    #[arg(long)]
    pub once: bool,

    /// Seconds between scheduled backups
    #[arg(long, env = "BACKUPINTERVAL", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Listen address of the health endpoint
    #[arg(long, env = "CONSUL_SNAPSHOT_HEALTH_ADDR", default_value = "0.0.0.0:5001")]
    pub health_addr: SocketAddr,

    /// Do not serve the health endpoint
    #[arg(long)]
    pub no_health: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Object key of the archive, e.g. backups/2024/3/7/node1.consul.snapshot.1709769600.tar.gz
    pub key: String,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Settings shared by backup and restore
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Consul agent address
    #[arg(long, env = "CONSUL_HTTP_ADDR", default_value = DEFAULT_CONSUL_ADDR)]
    pub consul_addr: String,

    /// Consul ACL token
    #[arg(long, env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    pub consul_token: Option<String>,

    /// Node name recorded in archives (defaults to the system hostname)
    #[arg(long)]
    pub hostname: Option<String>,

    /// S3 bucket
    #[arg(long, env = "S3BUCKET", default_value = "")]
    pub s3_bucket: String,

    /// S3 region
    #[arg(long, env = "S3REGION", default_value = "")]
    pub s3_region: String,

    /// Custom endpoint for S3-compatible storage
    #[arg(long, env = "S3ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// S3 server-side encryption (AES256 or aws:kms)
    #[arg(long, env = "CONSUL_SNAPSHOT_S3_SSE")]
    pub s3_sse: Option<String>,

    /// KMS key id for aws:kms server-side encryption
    #[arg(long, env = "CONSUL_SNAPSHOT_S3_SSE_KMS_KEY_ID")]
    pub s3_sse_kms_key_id: Option<String>,

    /// Google Cloud Storage bucket
    #[arg(long, env = "GCSBUCKET", default_value = "")]
    pub gcs_bucket: String,

    /// Remote key prefix
    #[arg(long, env = "CONSUL_SNAPSHOT_UPLOAD_PREFIX", default_value = DEFAULT_OBJECT_PREFIX)]
    pub prefix: String,

    /// Scratch directory for staging and downloads
    #[arg(long, env = "SNAPSHOT_TMP_DIR", default_value = DEFAULT_TMP_DIR)]
    pub tmp_dir: Utf8PathBuf,

    /// Archive encryption passphrase
    #[arg(long, env = "CRYPTO_PASSWORD", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Self-test mode: local archive only, no upload, single run
    #[arg(long, env = "ACCEPTANCE_TEST", value_parser = FalseyValueParser::new())]
    pub self_test: bool,
}
