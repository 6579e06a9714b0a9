//! Loads entity collections out of an extracted archive.

use super::inspect::ArchiveVersion;
use crate::checksum::verify_file;
use crate::layout::EntityKind;
use crate::serializer::from_json;
use camino::Utf8Path;
use consul_snapshot_core::{Error, Result, Snapshot, SnapshotMeta};
use serde::de::DeserializeOwned;
use std::fs;
use tracing::info;

/// Reads the snapshot held by an inspected archive.
pub fn load(version: &ArchiveVersion) -> Result<Snapshot> {
    let snapshot = match version {
        ArchiveVersion::Current { root, meta } => load_current(root, meta)?,
        ArchiveVersion::Legacy { source } => load_legacy(source)?,
    };

    info!(
        "Loaded {} keys, {} prepared queries, {} ACLs to restore",
        snapshot.kv.len(),
        snapshot.prepared_queries.len(),
        snapshot.acls.len()
    );
    Ok(snapshot)
}

fn load_current(root: &Utf8Path, meta: &SnapshotMeta) -> Result<Snapshot> {
    Ok(Snapshot {
        kv: load_entity(root, meta, EntityKind::Kv)?,
        prepared_queries: load_entity(root, meta, EntityKind::PreparedQueries)?,
        acls: load_entity(root, meta, EntityKind::Acls)?,
    })
}

/// Every entity file named by the metadata must exist and match its checksum.
fn load_entity<T: DeserializeOwned>(
    root: &Utf8Path,
    meta: &SnapshotMeta,
    kind: EntityKind,
) -> Result<Vec<T>> {
    let name = kind.file_name(meta.start_time);
    let path = root.join(&name);
    if !path.is_file() {
        return Err(Error::format(format!(
            "archive metadata lists {} data but {} is missing",
            kind, name
        )));
    }

    let expected = match kind {
        EntityKind::Kv => &meta.kv_checksum,
        EntityKind::PreparedQueries => &meta.pq_checksum,
        EntityKind::Acls => &meta.acl_checksum,
    };
    verify_file(&path, expected)?;

    from_json(kind, &fs::read(&path)?)
}

fn load_legacy(source: &Utf8Path) -> Result<Snapshot> {
    if source.is_dir() {
        return Err(Error::format(
            "archive has no metadata and is not a legacy KV stream",
        ));
    }
    let kv = from_json(EntityKind::Kv, &fs::read(source)?)?;
    Ok(Snapshot::kv_only(kv))
}
