//! Per-run staging directory.
//!
//! A run writes one JSON file per entity collection plus `meta.json` into a
//! fresh directory under the scratch directory. The checksums in the
//! metadata are taken from the files as written, so corruption between
//! serialization and disk shows up on restore.

use crate::checksum::file_checksum;
use crate::layout::EntityKind;
use crate::serializer::to_json;
use camino::{Utf8Path, Utf8PathBuf};
use consul_snapshot_core::types::META_FILENAME;
use consul_snapshot_core::{Result, Snapshot, SnapshotMeta};
use std::fs;
use tracing::debug;

/// Run identity recorded in the metadata
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub tool_version: String,
    pub node_name: String,
    pub start_time: i64,
}

/// A populated staging directory
#[derive(Debug, Clone)]
pub struct StagingDir {
    pub path: Utf8PathBuf,
    pub meta: SnapshotMeta,
}

/// Writes `snapshot` into `<tmp_dir>/<dir_name>/`.
///
/// An existing directory of the same name is replaced. Any write failure is
/// returned before anything is archived.
pub fn stage(
    tmp_dir: &Utf8Path,
    dir_name: &str,
    snapshot: &Snapshot,
    run: &RunInfo,
) -> Result<StagingDir> {
    let path = tmp_dir.join(dir_name);
    if path.exists() {
        debug!("Replacing stale staging directory {}", path);
        fs::remove_dir_all(&path)?;
    }
    fs::create_dir_all(&path)?;

    let kv_checksum = write_entity(&path, EntityKind::Kv, run.start_time, &to_json(&snapshot.kv)?)?;
    let pq_checksum = write_entity(
        &path,
        EntityKind::PreparedQueries,
        run.start_time,
        &to_json(&snapshot.prepared_queries)?,
    )?;
    let acl_checksum = write_entity(
        &path,
        EntityKind::Acls,
        run.start_time,
        &to_json(&snapshot.acls)?,
    )?;

    let meta = SnapshotMeta {
        tool_version: run.tool_version.clone(),
        kv_checksum,
        pq_checksum,
        acl_checksum,
        node_name: run.node_name.clone(),
        start_time: run.start_time,
        end_time: chrono::Utc::now().timestamp(),
    };
    fs::write(path.join(META_FILENAME), meta.to_json()?)?;

    debug!("Staged snapshot in {}", path);
    Ok(StagingDir { path, meta })
}

/// Writes one entity file and returns the checksum of what landed on disk.
fn write_entity(dir: &Utf8Path, kind: EntityKind, start: i64, data: &[u8]) -> Result<String> {
    let file = dir.join(kind.file_name(start));
    fs::write(&file, data)?;
    debug!("Wrote {} bytes of {} data to {}", data.len(), kind, file);
    file_checksum(&file)
}
