//! Tool version compatibility checks

use semver::Version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    MajorVersionMismatch { archive: u64, current: u64 },
    Unparsable { archive: String },
}

impl Compatibility {
    /// Compares the version recorded in an archive with `current`.
    pub fn check(archive_version: &str, current_version: &str) -> Self {
        let (Ok(archive), Ok(current)) = (
            Version::parse(archive_version.trim_start_matches('v')),
            Version::parse(current_version.trim_start_matches('v')),
        ) else {
            return Compatibility::Unparsable {
                archive: archive_version.to_string(),
            };
        };

        if archive.major != current.major {
            return Compatibility::MajorVersionMismatch {
                archive: archive.major,
                current: current.major,
            };
        }
        Compatibility::Compatible
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, Compatibility::Compatible)
    }

    pub fn message(&self) -> String {
        match self {
            Compatibility::Compatible => "archive version is compatible".to_string(),
            Compatibility::MajorVersionMismatch { archive, current } => format!(
                "archive was written by major version {} but this is major version {}",
                archive, current
            ),
            Compatibility::Unparsable { archive } => {
                format!("archive version {:?} is not a semantic version", archive)
            }
        }
    }
}
