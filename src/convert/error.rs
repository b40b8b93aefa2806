use crate::io::{self, StructureFormat};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to find file: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Invalid format '{value}' (expected one of: {})", accepted_formats())]
    InvalidFormat { value: String },

    #[error("failed to read '{}'", path.display())]
    Detect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load {format} structure")]
    Load {
        format: StructureFormat,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize structure as {format}")]
    Serialize {
        format: StructureFormat,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    pub fn invalid_format(value: impl Into<String>) -> Self {
        Self::InvalidFormat {
            value: value.into(),
        }
    }

    /// Errors caused by the command line itself rather than by file contents.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::InputNotFound { .. } | Self::InvalidFormat { .. })
    }
}

fn accepted_formats() -> String {
    StructureFormat::ALL
        .iter()
        .map(|f| f.extension())
        .collect::<Vec<_>>()
        .join(", ")
}
