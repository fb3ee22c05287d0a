//! celltinder-io: File I/O for celltinder.
//!
//! This crate resolves per-frame image/mask paths, decodes TIFF frames,
//! builds cropped cell image sets, and reads and writes the CSV cell table.
//!

pub mod cell_image_set;
mod error;
pub mod frames;
pub mod reader;
pub mod table;

pub use cell_image_set::CellImageSet;
pub use error::{Error, FrameRole, Result};
pub use frames::{frame_path, resolve_frame_path, well_id, FrameLayout};
pub use reader::{read_frame, read_image, read_mask, FramePixel};
pub use table::{CellTable, Column, ColumnData};
