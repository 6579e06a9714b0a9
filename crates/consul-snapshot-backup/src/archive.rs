//! Archive creation and extraction.
//!
//! Current archives are a gzip-compressed tar rooted at the staging
//! directory. Legacy archives are a bare gzip stream of one JSON document
//! with no tar layer. Extraction handles both and reports which it found.

use camino::{Utf8Path, Utf8PathBuf};
use consul_snapshot_core::types::META_FILENAME;
use consul_snapshot_core::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Read, Write};
use tar::{Archive, Builder as TarBuilder, Header};
use tracing::debug;

/// Name given to the payload of a bare gzip stream on extraction
pub const STREAM_PAYLOAD_NAME: &str = "payload.json";

/// Offset and value of the POSIX tar magic in the first header block
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8] = b"ustar";
const TAR_BLOCK_LEN: usize = 512;
const TAR_CKSUM_RANGE: std::ops::Range<usize> = 148..156;

/// What extraction produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// A tar archive, unpacked; the path is its single top-level directory
    /// (or the destination itself when members sit at the top level)
    Directory(Utf8PathBuf),
    /// A bare gzip stream, decompressed to this file
    Stream(Utf8PathBuf),
}

/// Packs `staging_dir` into a tar.gz at `archive_path`. Returns the archive size.
pub fn compress(staging_dir: &Utf8Path, archive_path: &Utf8Path) -> Result<u64> {
    let root = staging_dir
        .file_name()
        .ok_or_else(|| Error::format(format!("cannot archive {}", staging_dir)))?;

    let file = File::create(archive_path)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut tar = TarBuilder::new(encoder);
    tar.append_dir_all(root, staging_dir)?;

    let encoder = tar.into_inner()?;
    let mut writer = encoder.finish()?;
    writer.flush()?;

    let size = fs::metadata(archive_path)?.len();
    debug!("Compressed {} into {} ({} bytes)", staging_dir, archive_path, size);
    Ok(size)
}

/// Gzips a single document into a flat stream (the legacy layout).
pub fn compress_stream(data: &[u8], archive_path: &Utf8Path) -> Result<u64> {
    let file = File::create(archive_path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()?.flush()?;
    Ok(fs::metadata(archive_path)?.len())
}

/// Extracts `archive_path` into `dest_dir`, which must exist.
pub fn extract(archive_path: &Utf8Path, dest_dir: &Utf8Path) -> Result<Extracted> {
    let file = File::open(archive_path)?;
    let mut payload = Vec::new();
    GzDecoder::new(file)
        .read_to_end(&mut payload)
        .map_err(|e| Error::format(format!("{} is not a gzip archive: {}", archive_path, e)))?;

    if !is_tar(&payload) {
        let path = dest_dir.join(STREAM_PAYLOAD_NAME);
        fs::write(&path, &payload)?;
        debug!("Extracted gzip stream to {} ({} bytes)", path, payload.len());
        return Ok(Extracted::Stream(path));
    }

    Archive::new(Cursor::new(payload))
        .unpack(dest_dir)
        .map_err(|e| Error::format(format!("unable to unpack {}: {}", archive_path, e)))?;

    let root = archive_root(dest_dir)?;
    debug!("Extracted {} into {}", archive_path, root);
    Ok(Extracted::Directory(root))
}

/// True if the payload opens with a well-formed ustar header block. The magic
/// alone also occurs inside legacy JSON, so the header checksum must match too.
fn is_tar(payload: &[u8]) -> bool {
    let Some(block) = payload.get(..TAR_BLOCK_LEN) else {
        return false;
    };
    if &block[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()] != TAR_MAGIC {
        return false;
    }

    let recorded = match Header::from_byte_slice(block).cksum() {
        Ok(cksum) => cksum,
        Err(_) => return false,
    };
    // The checksum field itself counts as spaces
    let computed: u32 = block
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if TAR_CKSUM_RANGE.contains(&i) {
                u32::from(b' ')
            } else {
                u32::from(*b)
            }
        })
        .sum();
    recorded == computed
}

/// The single top-level directory of an unpacked archive, else `dest_dir`.
fn archive_root(dest_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    if dest_dir.join(META_FILENAME).exists() {
        return Ok(dest_dir.to_path_buf());
    }

    let entries = dest_dir
        .read_dir_utf8()?
        .collect::<std::io::Result<Vec<_>>>()?;

    match entries.as_slice() {
        [only] if only.file_type()?.is_dir() => Ok(only.path().to_path_buf()),
        _ => Ok(dest_dir.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_directory_round_trip() {
        let (_src, src) = utf8_tempdir();
        let staging = src.join("node1.consul.snapshot.1457136000");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("consul.kv.1457136000.json"), b"[]").unwrap();
        fs::write(staging.join("meta.json"), b"{}").unwrap();

        let archive = src.join("node1.consul.snapshot.1457136000.tar.gz");
        assert!(compress(&staging, &archive).unwrap() > 0);

        let (_dst, dst) = utf8_tempdir();
        let extracted = extract(&archive, &dst).unwrap();
        let root = dst.join("node1.consul.snapshot.1457136000");
        assert_eq!(extracted, Extracted::Directory(root.clone()));
        assert_eq!(fs::read(root.join("consul.kv.1457136000.json")).unwrap(), b"[]");
        assert!(root.join("meta.json").is_file());
    }

    #[test]
    fn test_archive_is_rooted_at_staging_dir() {
        let (_src, src) = utf8_tempdir();
        let staging = src.join("acceptancetest");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("meta.json"), b"{}").unwrap();
        let archive = src.join("acceptancetest.tar.gz");
        compress(&staging, &archive).unwrap();

        let mut tar = Archive::new(GzDecoder::new(File::open(&archive).unwrap()));
        let names: Vec<String> = tar
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| n.starts_with("acceptancetest")));
        assert!(names.iter().any(|n| n == "acceptancetest/meta.json"));
    }

    #[test]
    fn test_bare_gzip_stream() {
        let (_src, src) = utf8_tempdir();
        let archive = src.join("consul.snapshot.1457136000.gz");
        let body = br#"[{"Key":"a","Value":"MQ=="}]"#;
        compress_stream(body, &archive).unwrap();

        let (_dst, dst) = utf8_tempdir();
        match extract(&archive, &dst).unwrap() {
            Extracted::Stream(path) => assert_eq!(fs::read(path).unwrap(), body),
            other => panic!("expected a stream, got {:?}", other),
        }
    }

    #[test]
    fn test_not_gzip() {
        let (_src, src) = utf8_tempdir();
        let archive = src.join("garbage.tar.gz");
        fs::write(&archive, b"this is not gzip data").unwrap();

        let (_dst, dst) = utf8_tempdir();
        let err = extract(&archive, &dst).unwrap_err();
        assert_eq!(err.category(), consul_snapshot_core::ErrorCategory::Format);
    }

    #[test]
    fn test_tar_header_detection() {
        assert!(!is_tar(b"[]"));

        let mut magic_only = vec![0u8; 512];
        magic_only[257..262].copy_from_slice(b"ustar");
        assert!(!is_tar(&magic_only));

        let mut header = Header::new_ustar();
        header.set_path("acceptancetest/meta.json").unwrap();
        header.set_size(2);
        header.set_cksum();
        assert!(is_tar(header.as_bytes()));
    }

    #[test]
    fn test_legacy_stream_with_magic_at_header_offset() {
        let prefix = r#"[{"Key":""#;
        let key = format!("{}ustar/x", "k".repeat(257 - prefix.len()));
        let value = "MTEx".repeat(100);
        let body = format!(r#"{}{}","Value":"{}"}}]"#, prefix, key, value);
        assert_eq!(&body.as_bytes()[257..262], b"ustar");
        assert!(body.len() > 512);

        let (_src, src) = utf8_tempdir();
        let archive = src.join("legacy.gz");
        compress_stream(body.as_bytes(), &archive).unwrap();

        let (_dst, dst) = utf8_tempdir();
        match extract(&archive, &dst).unwrap() {
            Extracted::Stream(path) => assert_eq!(fs::read(path).unwrap(), body.as_bytes()),
            other => panic!("expected a stream, got {:?}", other),
        }
    }
}
