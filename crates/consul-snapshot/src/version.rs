//! What this build writes: tool version, archive layout and envelope marker

use consul_snapshot_backup::envelope::ENVELOPE_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Archive layout produced by backups from this build
pub const ARCHIVE_FORMAT: &str = "tar.gz with meta.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Recorded as `ToolVersion` in every archive and compared on restore
    pub version: String,
    /// Short git SHA, when the build provides `GIT_SHA`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub archive_format: String,
    /// Marker that prefixes encrypted archives
    pub envelope: String,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("GIT_SHA").map(String::from),
            archive_format: ARCHIVE_FORMAT.to_string(),
            envelope: envelope_marker(),
        }
    }

    /// Lines printed by `consul-snapshot version`
    pub fn details(&self) -> Vec<String> {
        vec![
            self.to_string(),
            format!("Archive format: {}", self.archive_format),
            format!("Envelope:       {}", self.envelope),
        ]
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "consul-snapshot {}", self.version)?;
        if let Some(commit) = &self.commit {
            write!(f, " ({})", commit)?;
        }
        Ok(())
    }
}

/// `v0` from the `v0:` byte prefix
fn envelope_marker() -> String {
    String::from_utf8_lossy(ENVELOPE_PREFIX)
        .trim_end_matches(':')
        .to_string()
}
