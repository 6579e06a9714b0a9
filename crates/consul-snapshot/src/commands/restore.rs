//! Restore command

use super::Runtime;
use crate::cli::RestoreArgs;
use anyhow::Result;
use consul_snapshot_backup::RestorePipeline;
use consul_snapshot_core::config::DEFAULT_INTERVAL_SECS;
use std::time::Duration;
use tracing::debug;

pub async fn run(args: RestoreArgs) -> Result<()> {
    let interval = Duration::from_secs(DEFAULT_INTERVAL_SECS);
    let runtime = Runtime::from_settings(&args.settings, interval).await?;
    let pipeline = RestorePipeline::new(runtime.config, runtime.store, runtime.remote)?;

    let report = pipeline.run(&args.key).await?;
    debug!("Restore report: {:?}", report);
    Ok(())
}
