//! File-to-file conversion workflow.
//!
//! A [`Conversion`] is planned from the command-line arguments (input path plus an optional
//! format name), then executed in two phases: loading the input into a [`Structure`] and
//! writing it next to the input as `<file name>.<extension>`.

mod error;

pub use error::Error;

use crate::io::{self, StructureFormat};
use crate::model::structure::Structure;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A fully resolved conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub input: PathBuf,
    pub source: StructureFormat,
    pub target: StructureFormat,
    pub output: PathBuf,
}

impl Conversion {
    /// Resolves formats and the output path for `input`.
    ///
    /// With `requested = None` the target follows the input file name: a PDB name becomes
    /// mmCIF and any other name becomes PDB. Otherwise `requested` must name one of `pdb`,
    /// `cif` or `mmtf` in any letter case. The reader is chosen separately and may fall back
    /// on content sniffing.
    ///
    /// # Errors
    ///
    /// [`Error::InputNotFound`] when `input` is not an existing file, [`Error::InvalidFormat`]
    /// for an unknown format name, and [`Error::Detect`] when the input cannot be read for
    /// content sniffing.
    pub fn plan(input: &Path, requested: Option<&str>) -> Result<Self, Error> {
        if !input.is_file() {
            let shown = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
            return Err(Error::input_not_found(shown));
        }

        let requested = requested
            .map(|name| StructureFormat::from_name(name).ok_or_else(|| Error::invalid_format(name)))
            .transpose()?;

        let source = io::detect_format(input).map_err(|source| Error::Detect {
            path: input.to_path_buf(),
            source,
        })?;
        let target = requested.unwrap_or_else(|| StructureFormat::default_target(input));

        let plan = Self {
            input: input.to_path_buf(),
            source,
            target,
            output: output_path(input, target),
        };
        log::info!(
            "Converting {} ({}) to {} ({})",
            plan.input.display(),
            plan.source,
            plan.output.display(),
            plan.target
        );
        Ok(plan)
    }

    /// Parses the input file with the reader for its detected format.
    pub fn load(&self) -> Result<Structure, Error> {
        let structure =
            io::load_structure(&self.input, self.source).map_err(|source| Error::Load {
                format: self.source,
                source,
            })?;

        log::info!(
            "Loaded {} atoms in {} chains across {} model(s)",
            structure.atom_count(),
            structure.chain_count(),
            structure.model_count()
        );
        Ok(structure)
    }

    /// Writes the structure to the output path and returns the number of bytes written.
    ///
    /// MMTF is encoded straight into the file; text formats are rendered in memory first.
    pub fn write(&self, structure: &Structure) -> Result<u64, Error> {
        let written = match self.target {
            StructureFormat::Mmtf => self.write_binary(structure)?,
            StructureFormat::Pdb | StructureFormat::Cif => self.write_text(structure)?,
        };
        log::info!("Wrote {} bytes to {}", written, self.output.display());
        Ok(written)
    }

    /// Loads the input and writes the converted output.
    pub fn run(&self) -> Result<u64, Error> {
        let structure = self.load()?;
        self.write(&structure)
    }

    fn write_text(&self, structure: &Structure) -> Result<u64, Error> {
        let text = match self.target {
            StructureFormat::Cif => io::mmcif::writer::to_string(structure),
            _ => io::pdb::writer::to_string(structure),
        }
        .map_err(|source| self.serialize_error(source))?;

        fs::write(&self.output, text.as_bytes()).map_err(|source| self.write_error(source))?;
        Ok(text.len() as u64)
    }

    fn write_binary(&self, structure: &Structure) -> Result<u64, Error> {
        let file = File::create(&self.output).map_err(|source| self.write_error(source))?;
        let mut writer = BufWriter::new(file);

        io::write_structure(&mut writer, structure, self.target).map_err(|e| match e {
            io::Error::Io { source, .. } => self.write_error(source),
            other => self.serialize_error(other),
        })?;
        writer.flush().map_err(|source| self.write_error(source))?;

        let file = writer
            .into_inner()
            .map_err(|e| self.write_error(e.into_error()))?;
        let len = file
            .metadata()
            .map_err(|source| self.write_error(source))?
            .len();
        Ok(len)
    }

    fn serialize_error(&self, source: io::Error) -> Error {
        Error::Serialize {
            format: self.target,
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> Error {
        Error::Write {
            path: self.output.clone(),
            source,
        }
    }
}

/// `<dir>/<file name>.<ext>`: the full input file name is kept and the target extension is
/// appended.
pub fn output_path(input: &Path, target: StructureFormat) -> PathBuf {
    let mut name = input
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".");
    name.push(target.extension());
    input.with_file_name(name)
}
