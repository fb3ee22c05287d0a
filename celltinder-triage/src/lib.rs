//! celltinder-triage: Threshold and selection state for cell triage.
//!
//! This crate layers ratio thresholding, keep/reject selection, and subset
//! navigation over a persisted cell table, and ties them together in a
//! [`TriageSession`].
//!

mod error;
pub mod navigation;
pub mod selection;
pub mod session;
pub mod threshold;

pub use error::{Error, Result};
pub use navigation::Cursor;
pub use selection::{active_subset, ensure_flag_column, SelectionState};
pub use session::TriageSession;
pub use threshold::{CellRecord, ThresholdTable};
