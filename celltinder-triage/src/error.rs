//! Triage error types.

use thiserror::Error;

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Triage error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Table or frame I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] celltinder_io::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] celltinder_core::Error),

    /// Subset index past the end of the frozen subset.
    #[error("index {index} out of range for subset of {len} cells")]
    IndexOutOfRange { index: usize, len: usize },

    /// Loading the image set of one cell failed.
    #[error("failed to load cell {index} (field {field_id}, label {mask_label}): {source}")]
    CellLoad {
        index: usize,
        field_id: String,
        mask_label: u32,
        #[source]
        source: celltinder_io::Error,
    },
}

impl Error {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::CoreError(celltinder_core::Error::InvalidState(message.into()))
    }

    /// Returns true for operations called in the wrong triage state.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            Self::CoreError(celltinder_core::Error::InvalidState(_))
        )
    }
}
