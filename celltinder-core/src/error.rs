//! Error types for celltinder-core.

use thiserror::Error;

/// Result type alias for celltinder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for celltinder operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was called before the state it depends on exists.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A stored threshold column name did not match `"<float> < x < <float>"`.
    #[error("cannot parse threshold column '{column}': {reason}")]
    Parse { column: String, reason: String },

    /// A threshold window bound was NaN or infinite.
    #[error("threshold bounds must be finite, got {lower} and {upper}")]
    InvalidWindow { lower: f64, upper: f64 },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
