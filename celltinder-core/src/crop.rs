//! Centroid crop-and-pad engine.
//!
//! Extracts a fixed `size × size` window around a centroid from a 2D frame.
//! Parts of the window outside the frame are zero-filled, so the output shape
//! never depends on where the centroid lies.

use crate::geometry::{Centroid, CropWindow};
use ndarray::{s, Array2, ArrayView2};

/// Crops `array` around `centroid` to exactly `size × size`.
///
/// With `isolate` set, every in-bounds pixel not equal to it is zeroed,
/// which reduces a multi-label mask to a single cell.
///
/// Out-of-bounds regions are filled with `T::default()` (zero for numeric
/// pixel types). A centroid entirely outside the source yields an all-zero
/// result.
#[must_use]
pub fn crop<T>(
    array: ArrayView2<'_, T>,
    centroid: Centroid,
    size: usize,
    isolate: Option<T>,
) -> Array2<T>
where
    T: Clone + Default + PartialEq,
{
    let window = CropWindow::around(centroid, size);
    let shape = array.dim();
    let mut out = Array2::from_elem((size, size), T::default());

    let Some((rows, cols)) = window.intersect(shape) else {
        return out;
    };

    let padding = window.padding(shape);
    let source = array.slice(s![rows.clone(), cols.clone()]);
    let top = padding.top;
    let left = padding.left;
    let mut target = out.slice_mut(s![top..top + rows.len(), left..left + cols.len()]);
    target.assign(&source);

    if let Some(value) = isolate {
        target.mapv_inplace(|px| if px == value { px } else { T::default() });
    }

    out
}

/// A reusable crop engine with a fixed output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropEngine {
    size: usize,
}

impl CropEngine {
    /// Creates an engine producing `size × size` crops.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Output side length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Crops an intensity image (no isolation).
    #[must_use]
    pub fn crop_image<T>(&self, array: ArrayView2<'_, T>, centroid: Centroid) -> Array2<T>
    where
        T: Clone + Default + PartialEq,
    {
        crop(array, centroid, self.size, None)
    }

    /// Crops a label mask, optionally keeping only pixels equal to `label`.
    #[must_use]
    pub fn crop_mask<T>(
        &self,
        array: ArrayView2<'_, T>,
        centroid: Centroid,
        label: Option<T>,
    ) -> Array2<T>
    where
        T: Clone + Default + PartialEq,
    {
        crop(array, centroid, self.size, label)
    }

    /// The window this engine would cut around `centroid`.
    #[must_use]
    pub fn window(&self, centroid: Centroid) -> CropWindow {
        CropWindow::around(centroid, self.size)
    }
}
