//! Centroid and crop-window geometry.
//!
//! Crop windows are anchored on the floored centroid, with `size / 2` pixels
//! before it. For even sizes this leaves one pixel more after the centroid
//! than before it.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cell centroid in pixel coordinates, `(y, x)` order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Centroid {
    /// Row coordinate.
    pub y: f64,
    /// Column coordinate.
    pub x: f64,
}

impl Centroid {
    /// Creates a centroid from `(y, x)`.
    #[must_use]
    pub fn new(y: f64, x: f64) -> Self {
        Self { y, x }
    }
}

impl From<(f64, f64)> for Centroid {
    fn from((y, x): (f64, f64)) -> Self {
        Self { y, x }
    }
}

/// Zero padding needed on each side of a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Padding {
    /// Returns true if no side needs padding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top == 0 && self.bottom == 0 && self.left == 0 && self.right == 0
    }
}

/// A requested crop window in source-array coordinates.
///
/// Bounds are half-open: rows `y_min..y_max`, columns `x_min..x_max`. They
/// may lie partly or entirely outside the source array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x_min: i64,
    pub x_max: i64,
    pub y_min: i64,
    pub y_max: i64,
}

impl CropWindow {
    /// Computes the `size × size` window around a centroid.
    #[must_use]
    pub fn around(centroid: Centroid, size: usize) -> Self {
        let size = i64::try_from(size).unwrap_or(i64::MAX);
        let half = size / 2;
        let x_min = anchor(centroid.x).saturating_sub(half);
        let y_min = anchor(centroid.y).saturating_sub(half);
        Self {
            x_min,
            x_max: x_min.saturating_add(size),
            y_min,
            y_max: y_min.saturating_add(size),
        }
    }

    /// Side length of the window.
    #[must_use]
    pub fn size(&self) -> usize {
        usize::try_from(self.x_max.saturating_sub(self.x_min)).unwrap_or(0)
    }

    /// Padding needed on each side for a source of `(rows, cols)`.
    #[must_use]
    pub fn padding(&self, shape: (usize, usize)) -> Padding {
        let (rows, cols) = (shape.0 as i64, shape.1 as i64);
        Padding {
            top: overhang(0, self.y_min),
            bottom: overhang(self.y_max, rows),
            left: overhang(0, self.x_min),
            right: overhang(self.x_max, cols),
        }
    }

    /// The in-bounds part of the window as `(rows, cols)` ranges, or `None`
    /// if the window misses the source entirely.
    #[must_use]
    pub fn intersect(
        &self,
        shape: (usize, usize),
    ) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let rows = clamp_range(self.y_min, self.y_max, shape.0)?;
        let cols = clamp_range(self.x_min, self.x_max, shape.1)?;
        Some((rows, cols))
    }
}

/// Largest coordinate magnitude a window is anchored at. Every `f64` beyond
/// it is already an integer and far outside any frame.
const MAX_ANCHOR: f64 = 9_007_199_254_740_992.0;

/// Floored coordinate, clamped to `±MAX_ANCHOR`. NaN anchors at 0.
fn anchor(coord: f64) -> i64 {
    coord.floor().clamp(-MAX_ANCHOR, MAX_ANCHOR) as i64
}

fn overhang(high: i64, low: i64) -> usize {
    usize::try_from(high.saturating_sub(low)).unwrap_or(0)
}

fn clamp_range(min: i64, max: i64, len: usize) -> Option<std::ops::Range<usize>> {
    let len = len as i64;
    let start = min.clamp(0, len);
    let end = max.clamp(0, len);
    if start >= end {
        return None;
    }
    Some(usize::try_from(start).ok()?..usize::try_from(end).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_odd_size_is_centered() {
        let window = CropWindow::around(Centroid::new(50.7, 20.2), 5);
        assert_eq!(window.y_min, 48);
        assert_eq!(window.y_max, 53);
        assert_eq!(window.x_min, 18);
        assert_eq!(window.x_max, 23);
        assert_eq!(window.size(), 5);
    }

    #[test]
    fn test_window_even_size_is_asymmetric() {
        let window = CropWindow::around(Centroid::new(10.0, 10.0), 4);
        // Two pixels before the centroid, one after it.
        assert_eq!((window.y_min, window.y_max), (8, 12));
        assert_eq!((window.x_min, window.x_max), (8, 12));
    }

    #[test]
    fn test_window_floors_negative_centroid() {
        let window = CropWindow::around(Centroid::new(-0.5, -1.5), 3);
        assert_eq!(window.y_min, -2);
        assert_eq!(window.x_min, -3);
    }

    #[test]
    fn test_window_far_outside_keeps_size() {
        for (y, x) in [(3.0, 1e20), (-1e300, 3.0), (f64::INFINITY, f64::NEG_INFINITY)] {
            let window = CropWindow::around(Centroid::new(y, x), 8);
            assert_eq!(window.size(), 8);
            assert_eq!(window.y_max - window.y_min, 8);
            assert!(window.intersect((10, 10)).is_none());
            let padding = window.padding((10, 10));
            assert!(padding.top + padding.bottom >= 8 || padding.left + padding.right >= 8);
        }
    }

    #[test]
    fn test_padding_at_corner() {
        let window = CropWindow::around(Centroid::new(2.0, 2.0), 8);
        let padding = window.padding((10, 10));
        assert_eq!(padding.top, 2);
        assert_eq!(padding.left, 2);
        assert_eq!(padding.bottom, 0);
        assert_eq!(padding.right, 0);
        assert!(!padding.is_empty());
    }

    #[test]
    fn test_intersect_outside_is_none() {
        let window = CropWindow::around(Centroid::new(500.0, 500.0), 8);
        assert!(window.intersect((10, 10)).is_none());

        let inside = CropWindow::around(Centroid::new(5.0, 5.0), 4);
        assert_eq!(inside.intersect((10, 10)), Some((3..7, 3..7)));
    }
}
