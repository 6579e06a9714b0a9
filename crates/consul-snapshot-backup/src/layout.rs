//! Names of staging directories, archives and archive members.

use std::fmt;

/// Fixed name used for staging and archives in self-test mode
pub const SELF_TEST_NAME: &str = "acceptancetest";

/// Extension of current-format archives
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// The three entity collections held by a current-format archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Kv,
    PreparedQueries,
    Acls,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Kv, EntityKind::PreparedQueries, EntityKind::Acls];

    fn stem(&self) -> &'static str {
        match self {
            EntityKind::Kv => "kv",
            EntityKind::PreparedQueries => "pq",
            EntityKind::Acls => "acl",
        }
    }

    /// Member file name for a run started at `start` (`consul.kv.<start>.json`)
    pub fn file_name(&self, start: i64) -> String {
        format!("consul.{}.{}.json", self.stem(), start)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Kv => "KV",
            EntityKind::PreparedQueries => "prepared query",
            EntityKind::Acls => "ACL",
        };
        f.write_str(label)
    }
}

/// Staging directory name: `<hostname>.consul.snapshot.<start>`
pub fn staging_dir_name(hostname: &str, start: i64, self_test: bool) -> String {
    if self_test {
        SELF_TEST_NAME.to_string()
    } else {
        format!("{}.consul.snapshot.{}", hostname, start)
    }
}

/// Archive file name: the staging directory name plus `.tar.gz`
pub fn archive_file_name(hostname: &str, start: i64, self_test: bool) -> String {
    format!(
        "{}.{}",
        staging_dir_name(hostname, start, self_test),
        ARCHIVE_EXTENSION
    )
}
