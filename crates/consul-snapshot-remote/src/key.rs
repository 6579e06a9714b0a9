use chrono::{DateTime, Datelike};
use consul_snapshot_core::{Error, Result};

/// Builds the remote object key for an archive created at `start` (Unix seconds).
///
/// The date is taken in UTC; month and day are not zero-padded.
pub fn remote_key(prefix: &str, start: i64, filename: &str) -> Result<String> {
    let date = DateTime::from_timestamp(start, 0)
        .ok_or_else(|| Error::config(format!("timestamp {} is out of range", start)))?;

    let partition = format!("{}/{}/{}", date.year(), date.month(), date.day());
    let prefix = prefix.trim_matches('/');

    Ok(if prefix.is_empty() {
        format!("{}/{}", partition, filename)
    } else {
        format!("{}/{}/{}", prefix, partition, filename)
    })
}
