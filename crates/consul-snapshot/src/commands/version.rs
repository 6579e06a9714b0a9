//! Version command

use crate::cli::VersionArgs;
use crate::version::VersionInfo;
use anyhow::Result;

pub fn run(args: VersionArgs) -> Result<()> {
    let info = VersionInfo::current();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        for line in info.details() {
            println!("{}", line);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ARCHIVE_FORMAT;

    fn info(commit: Option<&str>) -> VersionInfo {
        VersionInfo {
            version: "0.3.0".to_string(),
            commit: commit.map(String::from),
            archive_format: ARCHIVE_FORMAT.to_string(),
            envelope: "v0".to_string(),
        }
    }

    #[test]
    fn test_current_version_is_semver() {
        let info = VersionInfo::current();
        assert!(semver::Version::parse(&info.version).is_ok());
    }

    #[test]
    fn test_envelope_marker_matches_encrypted_archives() {
        assert_eq!(VersionInfo::current().envelope, "v0");
    }

    #[test]
    fn test_display_with_and_without_commit() {
        assert_eq!(info(None).to_string(), "consul-snapshot 0.3.0");
        assert_eq!(info(Some("abc1234")).to_string(), "consul-snapshot 0.3.0 (abc1234)");
    }

    #[test]
    fn test_details_lists_formats() {
        let lines = info(None).details();
        assert_eq!(lines[0], "consul-snapshot 0.3.0");
        assert!(lines.iter().any(|l| l.ends_with("tar.gz with meta.json")));
        assert!(lines.iter().any(|l| l.ends_with("v0")));
    }

    #[test]
    fn test_json_omits_missing_commit() {
        let json: serde_json::Value = serde_json::to_value(info(None)).unwrap();
        assert!(json.get("commit").is_none());
        assert_eq!(json["archive_format"], ARCHIVE_FORMAT);
        assert_eq!(json["version"], "0.3.0");
    }
}
