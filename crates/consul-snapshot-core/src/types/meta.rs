use serde::{Deserialize, Serialize};

/// Name of the metadata member inside a current-format archive
pub const META_FILENAME: &str = "meta.json";

/// Run metadata written as `meta.json` into every current-format archive.
///
/// Checksums are lowercase hex SHA-256 of each entity file as written to disk.
/// Archives written with snake_case keys (`start_time`, `kv_checksum`, ...)
/// read the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    #[serde(
        rename = "ToolVersion",
        alias = "ConsulSnapshotVersion",
        alias = "consul_snapshot_version",
        default
    )]
    pub tool_version: String,

    #[serde(rename = "KVChecksum", alias = "kv_checksum", default)]
    pub kv_checksum: String,

    #[serde(rename = "PQChecksum", alias = "pq_checksum", default)]
    pub pq_checksum: String,

    #[serde(rename = "ACLChecksum", alias = "acl_checksum", default)]
    pub acl_checksum: String,

    #[serde(rename = "NodeName", alias = "node_name", default)]
    pub node_name: String,

    /// Unix seconds at which the run started; names the entity files
    #[serde(rename = "StartTime", alias = "start_time")]
    pub start_time: i64,

    #[serde(rename = "EndTime", alias = "end_time", default)]
    pub end_time: i64,
}

impl SnapshotMeta {
    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses `meta.json`; anything unparsable is a format error.
    pub fn from_json(data: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| crate::Error::format(format!("unable to parse {}: {}", META_FILENAME, e)))
    }
}
