//! Backup command

use super::Runtime;
use crate::cli::BackupArgs;
use crate::health;
use anyhow::{Context, Result};
use consul_snapshot_backup::BackupPipeline;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

pub async fn run(args: BackupArgs) -> Result<()> {
    let runtime = Runtime::from_settings(&args.settings, Duration::from_secs(args.interval)).await?;
    let single_run = args.once || runtime.config.self_test;
    let store = runtime.store.clone();
    let pipeline = BackupPipeline::new(runtime.config, runtime.store, runtime.remote)?;

    if single_run {
        pipeline.run().await.context("Backup failed")?;
        return Ok(());
    }

    if !args.no_health {
        let addr = args.health_addr;
        tokio::spawn(async move {
            if let Err(e) = health::serve(addr, store).await {
                error!("Health endpoint stopped: {:#}", e);
            }
        });
    }

    let period = pipeline.config().interval;
    info!("Backing up every {} seconds", period.as_secs());

    let pipeline = &pipeline;
    schedule(period, interrupted(), move || async move {
        if let Err(e) = pipeline.run().await {
            warn!("Retrying at next interval after failure: {}", e);
        }
    })
    .await;
    Ok(())
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Calls `run` once per `period`, the first time after one full period, until
/// `shutdown` completes. A run in progress is always finished before returning.
async fn schedule<F, Fut>(period: Duration, shutdown: impl Future<Output = ()>, mut run: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted, stopping scheduler");
                return;
            }
        }

        let current = run();
        tokio::pin!(current);
        let mut stopping = false;
        loop {
            tokio::select! {
                _ = &mut current => break,
                _ = &mut shutdown, if !stopping => {
                    info!("Interrupted, stopping after the current backup");
                    stopping = true;
                }
            }
        }
        if stopping {
            return;
        }
    }
}
