//! Prepared queries and ACL entries
//!
//! Only `ID` and `Name` are interpreted; every other field is carried through
//! untouched so a backup never drops attributes a newer store version added.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A prepared query definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedQuery {
    #[serde(rename = "ID", default)]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    /// Remaining definition fields (Service, DNS, Template, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A legacy ACL token entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclEntry {
    #[serde(rename = "ID", default)]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    /// Remaining entry fields (Type, Rules, indices, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PreparedQuery {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Adds an opaque field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

impl AclEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Adds an opaque field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepared_query_keeps_unknown_fields() {
        let raw = json!({
            "ID": "8f246b77-f3e1-ff88-5b48-8ec93abf3e05",
            "Name": "geo-db",
            "Session": "",
            "Service": {
                "Service": "mysql",
                "Failover": { "NearestN": 3, "Datacenters": ["dc1", "dc2"] },
                "OnlyPassing": false,
                "Tags": ["primary", "!experimental"]
            },
            "DNS": { "TTL": "10s" }
        });

        let pq: PreparedQuery = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(pq.name, "geo-db");
        assert!(pq.fields.contains_key("Service"));

        let back = serde_json::to_value(&pq).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_acl_entry_round_trip() {
        let acl = AclEntry::new("anonymous", "Anonymous Token")
            .with_field("Type", json!("client"))
            .with_field("Rules", json!("key \"\" { policy = \"read\" }"));

        let encoded = serde_json::to_string(&acl).unwrap();
        let decoded: AclEntry = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, acl);
        assert!(encoded.contains("\"ID\":\"anonymous\""));
    }

    #[test]
    fn test_missing_id_defaults_to_empty() {
        let pq: PreparedQuery = serde_json::from_str(r#"{"Name":"only-name"}"#).unwrap();
        assert!(pq.id.is_empty());
        assert_eq!(pq.name, "only-name");
    }
}
