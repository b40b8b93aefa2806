//! Canonical error type for all structure IO operations.
//!
//! This module wraps parser, serializer, codec, and filesystem failures into a single
//! `Error` enum that the conversion workflow can bubble up or convert into user-facing
//! diagnostics with uniform wording.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing biomolecular data.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper around operating-system level I/O failures.
    #[error(
        "I/O error for {path_desc}: {source}",
        path_desc = PathDisplay(path)
    )]
    Io {
        /// Path to the file involved in the failed operation, if any.
        path: Option<PathBuf>,
        /// Underlying error emitted by the standard library.
        #[source]
        source: std::io::Error,
    },

    /// Indicates that an input line could not be parsed into the expected record.
    ///
    /// Exposes the textual format, source path, failing line number, and an explanatory
    /// detail string to assist with debugging malformed files.
    #[error(
        "failed to parse {format} {path_desc}: {details} (line {line_number})",
        path_desc = PathDisplay(path)
    )]
    Parse {
        /// Name of the textual format (e.g., `"PDB"`, `"mmCIF"`).
        format: &'static str,
        /// Path to the offending file, if known.
        path: Option<PathBuf>,
        /// One-based line number where parsing failed.
        line_number: usize,
        /// Human-readable description of what went wrong.
        details: String,
    },

    /// Reports logical inconsistencies such as mismatched counts or missing records.
    #[error(
        "inconsistent data in {format} {path_desc}: {details}",
        path_desc = PathDisplay(path)
    )]
    InconsistentData {
        /// Name of the format being processed.
        format: &'static str,
        /// Related file path when available.
        path: Option<PathBuf>,
        /// Summary of the detected inconsistency.
        details: String,
    },

    /// Binary payloads that cannot be decoded or encoded (MessagePack, MMTF codecs).
    #[error(
        "malformed {format} data in {path_desc}: {details}",
        path_desc = PathDisplay(path)
    )]
    Codec {
        /// Name of the binary format being processed.
        format: &'static str,
        /// Related file path when available.
        path: Option<PathBuf>,
        /// Description of the failing field or codec.
        details: String,
    },
}

impl Error {
    /// Constructs an [`Error::Io`] variant from a standard I/O error.
    ///
    /// # Arguments
    ///
    /// * `source` - The original `std::io::Error` emitted by the OS or runtime.
    /// * `path` - Optional file path associated with the operation.
    pub fn from_io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { path, source }
    }

    /// Builds a [`Error::Parse`] variant with consistent messaging.
    ///
    /// # Arguments
    ///
    /// * `format` - Name of the textual format being parsed.
    /// * `path` - Optional path pointing to the input file.
    /// * `line_number` - Line where the failure occurred (1-indexed).
    /// * `details` - Additional context about the parsing problem.
    pub fn parse(
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Parse {
            format,
            path,
            line_number,
            details: details.into(),
        }
    }

    /// Creates an [`Error::InconsistentData`] describing logical mismatches.
    pub fn inconsistent_data(
        format: &'static str,
        path: Option<PathBuf>,
        details: impl Into<String>,
    ) -> Self {
        Self::InconsistentData {
            format,
            path,
            details: details.into(),
        }
    }

    /// Creates an [`Error::Codec`] for undecodable binary content.
    pub fn codec(format: &'static str, details: impl Into<String>) -> Self {
        Self::Codec {
            format,
            path: None,
            details: details.into(),
        }
    }

    /// Attaches a file path to errors raised by stream-level readers and writers.
    ///
    /// Readers work on anonymous streams, so the file-based entry points call this to fill
    /// in the path once it is known. Paths already present are kept.
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        match self {
            Self::Io { path, source } => Self::Io {
                path: path.or(Some(file)),
                source,
            },
            Self::Parse {
                format,
                path,
                line_number,
                details,
            } => Self::Parse {
                format,
                path: path.or(Some(file)),
                line_number,
                details,
            },
            Self::InconsistentData {
                format,
                path,
                details,
            } => Self::InconsistentData {
                format,
                path: path.or(Some(file)),
                details,
            },
            Self::Codec {
                format,
                path,
                details,
            } => Self::Codec {
                format,
                path: path.or(Some(file)),
                details,
            },
        }
    }
}

/// Lightweight formatter for optional paths used in error messages.
///
/// When a path is present it prints `file '<path>'`; otherwise it emits `stream source` so
/// error messages remain grammatically consistent.
struct PathDisplay<'a>(&'a Option<PathBuf>);

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "file '{}'", p.display()),
            None => write!(f, "stream source"),
        }
    }
}
