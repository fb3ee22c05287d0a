//! celltinder-core: Core types and algorithms for cell triage.
//!
//! This crate provides the foundational pieces shared by the I/O and triage
//! layers: centroid crop geometry, the zero-padding crop engine, threshold
//! windows, and configuration.
//!

pub mod config;
pub mod crop;
pub mod error;
pub mod geometry;
pub mod threshold;

pub use config::{CropConfig, TableSchema, TriageConfig};
pub use crop::{crop, CropEngine};
pub use error::{Error, Result};
pub use geometry::{Centroid, CropWindow, Padding};
pub use threshold::{ThresholdWindow, THRESHOLD_MARKER, WINDOW_EPSILON};
