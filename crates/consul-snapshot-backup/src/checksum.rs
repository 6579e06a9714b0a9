//! SHA-256 checksums of staged entity files.

use camino::Utf8Path;
use consul_snapshot_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Lowercase hex SHA-256 of a file's on-disk bytes.
pub fn file_checksum(path: &Utf8Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compares a file against a recorded checksum. An empty record is not checked.
pub fn verify_file(path: &Utf8Path, expected: &str) -> Result<()> {
    if expected.is_empty() {
        return Ok(());
    }

    let actual = file_checksum(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(Error::format(format!(
            "checksum mismatch for {}: expected {}, got {}",
            path.file_name().unwrap_or(path.as_str()),
            expected,
            actual
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_file_matches_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("data.json")).unwrap();
        std::fs::write(&path, b"[1,2,3]").unwrap();

        assert_eq!(file_checksum(&path).unwrap(), sha256_hex(b"[1,2,3]"));
        assert!(verify_file(&path, &sha256_hex(b"[1,2,3]")).is_ok());
        assert!(verify_file(&path, "").is_ok());
    }

    #[test]
    fn test_mismatch_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("data.json")).unwrap();
        std::fs::write(&path, b"tampered").unwrap();

        let err = verify_file(&path, &sha256_hex(b"original")).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch for data.json"));
    }

    #[test]
    fn test_missing_file() {
        assert!(file_checksum(Utf8Path::new("/nonexistent/consul.kv.1.json")).is_err());
    }
}
