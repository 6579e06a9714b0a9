//! Passive health endpoint
//!
//! `GET /health` reports how long ago the last successful backup started,
//! reading only the last-backup marker key.

use axum::{extract::State, http::StatusCode, routing::get, Router};
use consul_snapshot_core::{Result, StoreClient, LAST_BACKUP_KEY};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Oldest marker, in seconds, still reported as healthy
pub const MAX_BACKUP_AGE_SECS: i64 = 3600;

pub fn router(store: Arc<dyn StoreClient>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(store)
}

/// Serves the health endpoint until the listener fails.
pub async fn serve(addr: SocketAddr, store: Arc<dyn StoreClient>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health endpoint listening on http://{}/health", addr);
    axum::serve(listener, router(store)).await?;
    Ok(())
}

async fn health(State(store): State<Arc<dyn StoreClient>>) -> (StatusCode, String) {
    let marker = store
        .get_kv(LAST_BACKUP_KEY)
        .await
        .map(|entry| entry.map(|e| String::from_utf8_lossy(&e.value).into_owned()));
    let (status, body) = evaluate(marker, chrono::Utc::now().timestamp());
    debug!("Health check: {} {}", status, body);
    (status, body)
}

/// Maps the marker read (or the error reading it) to a response.
pub fn evaluate(marker: Result<Option<String>>, now: i64) -> (StatusCode, String) {
    let raw = match marker {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "No backup recorded yet".to_string(),
            )
        }
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Unable to read last backup time: {}", err),
            )
        }
    };

    let last = match raw.trim().parse::<i64>() {
        Ok(last) => last,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Invalid last backup time {:?}", raw),
            )
        }
    };

    // A marker slightly ahead of this host's clock counts as just written
    let age = (now - last).max(0);
    if age > MAX_BACKUP_AGE_SECS {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Backup older than 1 hour".to_string(),
        )
    } else {
        (StatusCode::OK, format!("Last backup {} seconds ago", age))
    }
}
