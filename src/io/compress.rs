//! Transparent gzip handling for structure inputs.
//!
//! Deposited archives commonly ship as `*.pdb.gz`, `*.cif.gz` or `*.mmtf.gz`. Inputs are
//! decompressed when either the path ends in `.gz` or the payload starts with the gzip magic
//! bytes, so renamed archives are handled as well.

use crate::io::error::Error;
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Returns `true` when the path carries a `.gz` extension (any letter case).
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("gz"))
}

/// Returns `true` when the buffer begins with the gzip magic bytes.
pub fn is_gzip_bytes(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Inflates a gzip payload held in memory.
pub fn decompress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len() * 4);
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

/// Reads a whole file, inflating it when it is gzip-compressed.
///
/// # Errors
///
/// Returns [`Error::Io`] carrying the path when the file cannot be read or the gzip stream is
/// corrupt.
pub fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    let raw = fs::read(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;

    if is_gzip_bytes(&raw) {
        log::debug!("Decompressing gzip input {}", path.display());
        decompress(&raw).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))
    } else {
        if is_gzip_path(path) {
            log::warn!(
                "{} has a .gz extension but is not gzip-compressed; reading as plain text",
                path.display()
            );
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn is_gzip_path_ignores_case() {
        assert!(is_gzip_path(Path::new("1abc.pdb.gz")));
        assert!(is_gzip_path(Path::new("1ABC.CIF.GZ")));
        assert!(!is_gzip_path(Path::new("1abc.pdb")));
        assert!(!is_gzip_path(Path::new("gz")));
    }

    #[test]
    fn read_file_inflates_gzip_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1abc.pdb.gz");
        fs::write(&path, gzip(b"HEADER    TEST\n")).unwrap();

        let bytes = read_file(&path).unwrap();

        assert_eq!(bytes, b"HEADER    TEST\n");
    }

    #[test]
    fn read_file_detects_gzip_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renamed.pdb");
        fs::write(&path, gzip(b"END\n")).unwrap();

        assert_eq!(read_file(&path).unwrap(), b"END\n");
    }

    #[test]
    fn read_file_passes_plain_text_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.pdb.gz");
        fs::write(&path, b"END\n").unwrap();

        assert_eq!(read_file(&path).unwrap(), b"END\n");
    }

    #[test]
    fn read_file_reports_missing_path() {
        let err = read_file(Path::new("/definitely/not/here.pdb")).unwrap_err();

        match err {
            Error::Io { path, .. } => {
                assert_eq!(path.unwrap(), Path::new("/definitely/not/here.pdb"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
