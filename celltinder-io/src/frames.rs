//! Per-frame file addressing.
//!
//! Frame files sit next to a "base path" that carries the stem and extension
//! but no frame number: `A1_03_measure.tif` addresses
//! `A1_03_measure_1.tif`, `A1_03_measure_2.tif`, and so on.

use crate::{Error, Result};
use celltinder_core::CropConfig;
use std::path::{Path, PathBuf};

/// Builds the path of `frame` from a base path, without touching the disk.
#[must_use]
pub fn frame_path(base: &Path, frame: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}_{frame}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{frame}"),
    };
    base.with_file_name(file_name)
}

/// Resolves the path of `frame` and checks that it exists.
///
/// # Errors
/// Returns [`Error::NotFound`] if the frame file does not exist.
pub fn resolve_frame_path(base: &Path, frame: u32) -> Result<PathBuf> {
    let path = frame_path(base, frame);
    if !path.exists() {
        return Err(Error::NotFound { path });
    }
    Ok(path)
}

/// Returns the well id of a field: its prefix up to the first `_`.
#[must_use]
pub fn well_id(field_id: &str) -> &str {
    field_id.split('_').next().unwrap_or(field_id)
}

/// Directory layout of image and mask frames relative to a cell table.
///
/// For a table in `root/` and field `A1_03`, images live in
/// `root/A1_images/` and masks in `root/A1_masks/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    root: PathBuf,
    image_label: String,
    mask_label: String,
    extension: String,
}

impl FrameLayout {
    /// Creates a layout rooted at `root` with explicit labels.
    pub fn new(
        root: impl Into<PathBuf>,
        image_label: &str,
        mask_label: &str,
        extension: &str,
    ) -> Self {
        Self {
            root: root.into(),
            image_label: image_label.to_string(),
            mask_label: mask_label.to_string(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Creates the layout for the table at `table_path`.
    #[must_use]
    pub fn for_table(table_path: &Path, config: &CropConfig) -> Self {
        let root = table_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::new(
            root,
            &config.image_label,
            &config.mask_label,
            &config.extension,
        )
    }

    /// Directory holding the field's image frames.
    #[must_use]
    pub fn image_dir(&self, field_id: &str) -> PathBuf {
        self.root.join(format!("{}_images", well_id(field_id)))
    }

    /// Directory holding the field's mask frames.
    #[must_use]
    pub fn mask_dir(&self, field_id: &str) -> PathBuf {
        self.root.join(format!("{}_masks", well_id(field_id)))
    }

    /// Base path (no frame number) of the field's image frames.
    #[must_use]
    pub fn image_base(&self, field_id: &str) -> PathBuf {
        self.image_dir(field_id)
            .join(self.file_name(field_id, &self.image_label))
    }

    /// Base path (no frame number) of the field's mask frames.
    #[must_use]
    pub fn mask_base(&self, field_id: &str) -> PathBuf {
        self.mask_dir(field_id)
            .join(self.file_name(field_id, &self.mask_label))
    }

    fn file_name(&self, field_id: &str, label: &str) -> String {
        if self.extension.is_empty() {
            format!("{field_id}_{label}")
        } else {
            format!("{field_id}_{label}.{}", self.extension)
        }
    }
}
