//! Crop and table-schema configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for loading and cropping a cell's frames.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CropConfig {
    /// Side length of every crop (pixels).
    pub crop_size: usize,
    /// Number of frames per cell, numbered from 1.
    pub n_frames: u32,
    /// File label for intensity images (`{fov}_{label}_{frame}.{ext}`).
    pub image_label: String,
    /// File label for masks.
    pub mask_label: String,
    /// Frame file extension without the dot.
    pub extension: String,
    /// Zero mask pixels that do not carry the cell's own label.
    pub isolate_masks: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            crop_size: 151,
            n_frames: 2,
            image_label: "measure".to_string(),
            mask_label: "mask".to_string(),
            extension: "tif".to_string(),
            isolate_masks: false,
        }
    }
}

impl CropConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the crop size.
    #[must_use]
    pub fn with_crop_size(mut self, size: usize) -> Self {
        self.crop_size = size;
        self
    }

    /// Sets the number of frames.
    #[must_use]
    pub fn with_n_frames(mut self, n_frames: u32) -> Self {
        self.n_frames = n_frames;
        self
    }

    /// Sets the image and mask file labels.
    #[must_use]
    pub fn with_labels(mut self, image_label: &str, mask_label: &str) -> Self {
        self.image_label = image_label.to_string();
        self.mask_label = mask_label.to_string();
        self
    }

    /// Enables or disables per-cell mask isolation.
    #[must_use]
    pub fn with_isolate_masks(mut self, isolate: bool) -> Self {
        self.isolate_masks = isolate;
        self
    }

    /// Checks the configuration for values that cannot produce a crop.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for a zero crop size or an empty label.
    pub fn validate(&self) -> Result<()> {
        if self.crop_size == 0 {
            return Err(Error::ConfigError("crop_size must be positive".into()));
        }
        if self.image_label.is_empty() || self.mask_label.is_empty() {
            return Err(Error::ConfigError("file labels must not be empty".into()));
        }
        Ok(())
    }
}

/// Column names for each role in the cell table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableSchema {
    pub ratio: String,
    pub centroid_y: String,
    pub centroid_x: String,
    pub field_id: String,
    pub mask_label: String,
    /// Boolean kept/rejected flag, added on the first triage pass.
    pub flag: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            ratio: "ratio".to_string(),
            centroid_y: "centroid_y".to_string(),
            centroid_x: "centroid_x".to_string(),
            field_id: "fov_ID".to_string(),
            mask_label: "cell_numb".to_string(),
            flag: "kept".to_string(),
        }
    }
}

impl TableSchema {
    /// Sets the flag column name.
    #[must_use]
    pub fn with_flag(mut self, name: &str) -> Self {
        self.flag = name.to_string();
        self
    }

    /// Columns every cell table must carry.
    #[must_use]
    pub fn required(&self) -> [&str; 5] {
        [
            self.ratio.as_str(),
            self.centroid_y.as_str(),
            self.centroid_x.as_str(),
            self.field_id.as_str(),
            self.mask_label.as_str(),
        ]
    }
}

/// Full configuration for a triage session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TriageConfig {
    pub crop: CropConfig,
    pub schema: TableSchema,
}

impl TriageConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the crop configuration.
    #[must_use]
    pub fn with_crop(mut self, crop: CropConfig) -> Self {
        self.crop = crop;
        self
    }

    /// Replaces the table schema.
    #[must_use]
    pub fn with_schema(mut self, schema: TableSchema) -> Self {
        self.schema = schema;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_config_builders() {
        let config = CropConfig::new()
            .with_crop_size(64)
            .with_n_frames(3)
            .with_labels("gfp", "seg")
            .with_isolate_masks(true);

        assert_eq!(config.crop_size, 64);
        assert_eq!(config.n_frames, 3);
        assert_eq!(config.image_label, "gfp");
        assert_eq!(config.mask_label, "seg");
        assert!(config.isolate_masks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_crop_config_validation() {
        assert!(CropConfig::new().with_crop_size(0).validate().is_err());
        assert!(CropConfig::new().with_labels("", "mask").validate().is_err());
    }

    #[test]
    fn test_schema_defaults() {
        let schema = TableSchema::default();
        assert_eq!(
            schema.required(),
            ["ratio", "centroid_y", "centroid_x", "fov_ID", "cell_numb"]
        );
        assert_eq!(schema.with_flag("process").flag, "process");
    }
}
