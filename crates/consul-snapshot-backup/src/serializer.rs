//! JSON encoding of entity collections.

use crate::layout::EntityKind;
use consul_snapshot_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a collection as a JSON array.
pub fn to_json<T: Serialize>(entries: &[T]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(entries)?)
}

/// Decodes a JSON array written by [`to_json`]. Bad input is a format error.
pub fn from_json<T: DeserializeOwned>(kind: EntityKind, data: &[u8]) -> Result<Vec<T>> {
    serde_json::from_slice(data)
        .map_err(|e| Error::format(format!("unable to parse {} data: {}", kind, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use consul_snapshot_core::{AclEntry, ErrorCategory, KvEntry, PreparedQuery};
    use serde_json::json;

    #[test]
    fn test_kv_round_trip() {
        let entries = vec![
            KvEntry::new("a", "1"),
            KvEntry::new("folder/", Vec::new()),
            KvEntry::new("bin", vec![0u8, 159, 255]).with_flags(42),
        ];
        let data = to_json(&entries).unwrap();
        let decoded: Vec<KvEntry> = from_json(EntityKind::Kv, &data).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn test_catalog_round_trip_keeps_unknown_fields() {
        let queries = vec![PreparedQuery::new("8f246b77", "web")
            .with_field("Service", json!({"Service": "web", "OnlyPassing": true}))
            .with_field("Template", json!({"Type": "", "Regexp": ""}))];
        let decoded: Vec<PreparedQuery> =
            from_json(EntityKind::PreparedQueries, &to_json(&queries).unwrap()).unwrap();
        assert_eq!(decoded, queries);

        let acls = vec![AclEntry::new("anonymous", "Anonymous Token")
            .with_field("Type", json!("client"))
            .with_field("Rules", json!(""))];
        let decoded: Vec<AclEntry> = from_json(EntityKind::Acls, &to_json(&acls).unwrap()).unwrap();
        assert_eq!(decoded, acls);
    }

    #[test]
    fn test_empty_collection() {
        let data = to_json::<KvEntry>(&[]).unwrap();
        assert_eq!(data, b"[]");
        let decoded: Vec<KvEntry> = from_json(EntityKind::Kv, &data).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_garbage_is_format_error() {
        let err = from_json::<KvEntry>(EntityKind::Kv, b"{\"Key\":").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Format);
        assert!(err.to_string().contains("KV"));
    }
}
