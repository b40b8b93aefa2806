mod builder;
pub mod compress;
mod error;
pub mod format;
pub mod mmcif;
pub mod mmtf;
pub mod pdb;

use crate::model::structure::Structure;
use std::io::{BufReader, Write};
use std::path::Path;

pub use pdb::reader::read as read_pdb_structure;
pub use pdb::writer::write_structure as write_pdb_structure;

pub use mmcif::reader::read as read_mmcif_structure;
pub use mmcif::writer::write_structure as write_mmcif_structure;

pub use mmtf::reader::read as read_mmtf_structure;
pub use mmtf::writer::write_structure as write_mmtf_structure;

pub use error::Error;
pub use format::StructureFormat;

/// Parses an in-memory (already decompressed) payload with the reader for `format`.
pub fn read_structure(bytes: &[u8], format: StructureFormat) -> Result<Structure, Error> {
    match format {
        StructureFormat::Pdb => read_pdb_structure(BufReader::new(bytes)),
        StructureFormat::Cif => read_mmcif_structure(bytes),
        StructureFormat::Mmtf => mmtf::reader::from_slice(bytes),
    }
}

/// Serializes the structure in `format` into any writer.
pub fn write_structure<W: Write>(
    writer: W,
    structure: &Structure,
    format: StructureFormat,
) -> Result<(), Error> {
    match format {
        StructureFormat::Pdb => write_pdb_structure(writer, structure),
        StructureFormat::Cif => write_mmcif_structure(writer, structure),
        StructureFormat::Mmtf => write_mmtf_structure(writer, structure),
    }
}

/// Determines the format of a file on disk.
///
/// The extension is authoritative when recognized; otherwise the (decompressed) content is
/// inspected.
pub fn detect_format(path: &Path) -> Result<StructureFormat, Error> {
    if let Some(format) = StructureFormat::from_path(path) {
        return Ok(format);
    }
    let content = compress::read_file(path)?;
    Ok(StructureFormat::guess(path, &content))
}

/// Reads and parses a structure file, decompressing gzip input transparently.
///
/// Errors raised by the format readers are tagged with `path`.
pub fn load_structure(path: &Path, format: StructureFormat) -> Result<Structure, Error> {
    let content = compress::read_file(path)?;
    log::debug!(
        "Read {} bytes of {} from {}",
        content.len(),
        format,
        path.display()
    );
    read_structure(&content, format).map_err(|e| e.with_path(path))
}
