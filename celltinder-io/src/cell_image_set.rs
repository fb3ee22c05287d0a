//! Eagerly loaded, cropped frames of a single cell.

use crate::error::FrameRole;
use crate::frames::resolve_frame_path;
use crate::reader::{read_image, read_mask};
use crate::{Error, Result};
use celltinder_core::{Centroid, CropConfig, CropEngine};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::path::Path;

/// Cropped image and mask frames of one cell, keyed by 1-based frame number.
///
/// Every array is `crop_size × crop_size`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellImageSet {
    pub images: BTreeMap<u32, Array2<f32>>,
    pub masks: BTreeMap<u32, Array2<u32>>,
}

impl CellImageSet {
    /// Loads and crops every image and mask frame of a cell.
    ///
    /// `image_base` and `mask_base` are frame base paths (see
    /// [`crate::frames`]). When `config.isolate_masks` is set, mask pixels
    /// not equal to `mask_label` are zeroed.
    ///
    /// # Errors
    /// Returns [`Error::Frame`] wrapping the [`Error::NotFound`] or
    /// [`Error::Read`] of the first frame that fails to load.
    pub fn build(
        centroid: Centroid,
        image_base: &Path,
        mask_base: &Path,
        mask_label: u32,
        config: &CropConfig,
    ) -> Result<Self> {
        let engine = CropEngine::new(config.crop_size);
        let isolate = config.isolate_masks.then_some(mask_label);

        let mut set = Self::default();
        for frame in 1..=config.n_frames {
            let image = load(FrameRole::Image, image_base, frame, read_image)?;
            set.images.insert(frame, engine.crop_image(image.view(), centroid));

            let mask = load(FrameRole::Mask, mask_base, frame, read_mask)?;
            set.masks
                .insert(frame, engine.crop_mask(mask.view(), centroid, isolate));
        }
        log::debug!(
            "loaded {} frames around ({}, {}) from {}",
            config.n_frames,
            centroid.y,
            centroid.x,
            image_base.display()
        );
        Ok(set)
    }

    /// Number of loaded frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns true if no frames were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Cropped image of `frame`.
    #[must_use]
    pub fn image(&self, frame: u32) -> Option<&Array2<f32>> {
        self.images.get(&frame)
    }

    /// Cropped mask of `frame`.
    #[must_use]
    pub fn mask(&self, frame: u32) -> Option<&Array2<u32>> {
        self.masks.get(&frame)
    }
}

fn load<T>(
    role: FrameRole,
    base: &Path,
    frame: u32,
    read: fn(&Path) -> Result<Array2<T>>,
) -> Result<Array2<T>> {
    resolve_frame_path(base, frame)
        .and_then(|path| read(&path))
        .map_err(|source| Error::Frame {
            role,
            frame,
            source: Box::new(source),
        })
}
