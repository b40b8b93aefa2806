//! Structure file formats and the heuristics used to recognize them.
//!
//! A format is recognized from the file name first (after stripping a trailing `.gz`). When the
//! extension says nothing useful, the leading bytes of the payload decide: MessagePack maps are
//! MMTF, text starting with a `data_` block is mmCIF, and everything else is treated as PDB.

use crate::io::compress;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The structure file formats the converter reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureFormat {
    /// Legacy fixed-column Protein Data Bank format.
    Pdb,
    /// Macromolecular Crystallographic Information File.
    Cif,
    /// Macromolecular Transmission Format (MessagePack binary).
    Mmtf,
}

impl StructureFormat {
    /// Every supported format, in the order used by help and error messages.
    pub const ALL: [StructureFormat; 3] = [Self::Pdb, Self::Cif, Self::Mmtf];

    /// Canonical lowercase file extension used for output files.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdb => "pdb",
            Self::Cif => "cif",
            Self::Mmtf => "mmtf",
        }
    }

    /// Human-readable format name used in log and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdb => "PDB",
            Self::Cif => "mmCIF",
            Self::Mmtf => "MMTF",
        }
    }

    /// The text format a conversion without an explicit target writes, judged by file name
    /// alone: a PDB name turns into mmCIF and every other name, recognized or not, into PDB.
    pub fn default_target(path: &Path) -> Self {
        match Self::from_path(path) {
            Some(Self::Pdb) => Self::Cif,
            _ => Self::Pdb,
        }
    }

    /// Parses a user-supplied format name (`pdb`, `cif`, `mmtf`) in any letter case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(name.trim()))
    }

    /// Maps a file name to a format by extension, looking through a trailing `.gz`.
    ///
    /// `pdb` and `ent` map to PDB, `cif` and `mmcif` to mmCIF, `mmtf` to MMTF. Returns `None`
    /// for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        let path = if compress::is_gzip_path(path) {
            Path::new(path.file_stem()?)
        } else {
            path
        };

        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdb" | "ent" => Some(Self::Pdb),
            "cif" | "mmcif" => Some(Self::Cif),
            "mmtf" => Some(Self::Mmtf),
            _ => None,
        }
    }

    /// Recognizes a format from (already decompressed) file content.
    pub fn sniff(bytes: &[u8]) -> Self {
        let start = bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(bytes.len());
        let content = &bytes[start..];

        match content.first() {
            Some(0x80..=0x8f | 0xde | 0xdf) => return Self::Mmtf,
            None => return Self::Pdb,
            _ => {}
        }

        let text = String::from_utf8_lossy(&content[..content.len().min(4096)]);
        let first_significant = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'));

        match first_significant {
            Some(line)
                if line.starts_with("data_")
                    || line.starts_with("loop_")
                    || line.starts_with('_') =>
            {
                Self::Cif
            }
            _ => Self::Pdb,
        }
    }

    /// Guesses the format of an input file: extension first, then content.
    ///
    /// `content` is the decompressed payload of the file. Falling back on content is logged
    /// at `warn` level since the file name was not informative.
    pub fn guess(path: &Path, content: &[u8]) -> Self {
        if let Some(format) = Self::from_path(path) {
            log::debug!("Recognized {} from file name {}", format, path.display());
            return format;
        }

        let format = Self::sniff(content);
        log::warn!(
            "Unrecognized extension on {}; content looks like {}",
            path.display(),
            format
        );
        format
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StructureFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Invalid format '{}'", s))
    }
}
