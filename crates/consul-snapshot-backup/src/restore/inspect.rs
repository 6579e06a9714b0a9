//! Archive version detection.

use crate::archive::Extracted;
use camino::Utf8PathBuf;
use consul_snapshot_core::types::META_FILENAME;
use consul_snapshot_core::{Result, SnapshotMeta};
use std::fs;
use tracing::info;

/// Format of an extracted archive
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveVersion {
    /// Per-entity JSON files plus `meta.json`
    Current { root: Utf8PathBuf, meta: SnapshotMeta },
    /// No metadata: a single JSON array of KV entries
    Legacy { source: Utf8PathBuf },
}

/// Classifies an extracted archive by the presence of `meta.json`.
pub fn inspect(extracted: &Extracted) -> Result<ArchiveVersion> {
    let (root, source) = match extracted {
        Extracted::Directory(root) => (Some(root), root),
        Extracted::Stream(path) => (None, path),
    };

    if let Some(root) = root {
        let meta_path = root.join(META_FILENAME);
        if meta_path.is_file() {
            let meta = SnapshotMeta::from_json(&fs::read(&meta_path)?)?;
            info!(
                "Found metadata for snapshot version {} taken at {} on {}",
                meta.tool_version,
                meta.start_time,
                if meta.node_name.is_empty() {
                    "unknown node"
                } else {
                    meta.node_name.as_str()
                }
            );
            return Ok(ArchiveVersion::Current {
                root: root.clone(),
                meta,
            });
        }
    }

    info!("No metadata found, treating archive as a legacy KV-only snapshot");
    Ok(ArchiveVersion::Legacy {
        source: source.clone(),
    })
}
