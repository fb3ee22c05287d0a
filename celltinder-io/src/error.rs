//! I/O error types.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which half of a cell image set a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRole {
    Image,
    Mask,
}

impl fmt::Display for FrameRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Mask => f.write_str("mask"),
        }
    }
}

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse or write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An expected frame or table file does not exist.
    #[error("file not found at: {}", path.display())]
    NotFound { path: PathBuf },

    /// A file exists but could not be decoded.
    #[error("error reading image file at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Loading one frame of a cell image set failed.
    #[error("failed to load {role} frame {frame}: {source}")]
    Frame {
        role: FrameRole,
        frame: u32,
        #[source]
        source: Box<Error>,
    },

    /// A required table column is absent.
    #[error("missing column '{0}'")]
    MissingColumn(String),

    /// A table cell could not be interpreted as the expected type.
    #[error("invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    /// Row index past the end of the table.
    #[error("row {row} out of range for table with {len} rows")]
    RowOutOfRange { row: usize, len: usize },

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] celltinder_core::Error),
}

impl Error {
    /// Returns true if this error, or the frame error it wraps, is a missing file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Frame { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    pub(crate) fn read<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Read {
            path: path.into(),
            source: source.into(),
        }
    }
}
