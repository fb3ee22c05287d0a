//! Threshold windows and their column-name encoding.
//!
//! A committed window is stored in the cell table as a boolean column named
//! `"{lower} < x < {upper}"`. The name is the only record of the bounds, so
//! it is written with `f64`'s shortest round-trip formatting and parsed back
//! on load.

use crate::error::{Error, Result};

/// Substring that identifies a threshold column.
pub const THRESHOLD_MARKER: &str = "< x <";

/// Amount the upper bound is raised above the lower bound when user input
/// inverts the window.
pub const WINDOW_EPSILON: f64 = 0.01;

const SEPARATOR: &str = " < x < ";

/// A ratio window and, once committed, the table column that records it.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdWindow {
    pub lower: f64,
    pub upper: f64,
    pub column: Option<String>,
}

impl ThresholdWindow {
    /// Creates an uncommitted window, clamping `upper` to
    /// `lower + WINDOW_EPSILON` when `lower >= upper`.
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        let (lower, upper) = clamp_bounds(lower, upper);
        Self {
            lower,
            upper,
            column: None,
        }
    }

    /// Creates a committed window whose column name encodes the bounds.
    ///
    /// # Errors
    /// Returns [`Error::InvalidWindow`] if either bound is not finite.
    pub fn committed(lower: f64, upper: f64) -> Result<Self> {
        let mut window = Self::new(lower, upper);
        if !window.lower.is_finite() || !window.upper.is_finite() {
            return Err(Error::InvalidWindow { lower, upper });
        }
        window.column = Some(column_name(window.lower, window.upper));
        Ok(window)
    }

    /// Returns the bounds as a tuple.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Returns true if this window has a table column.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.column.is_some()
    }

    /// Strict membership used for the stored column.
    #[must_use]
    pub fn contains_strict(&self, value: f64) -> bool {
        self.lower < value && value < self.upper
    }

    /// Inclusive membership used for counting.
    #[must_use]
    pub fn contains_inclusive(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Applies the window invariant to raw bounds.
///
/// NaN bounds are returned unchanged and contain no value.
#[must_use]
pub fn clamp_bounds(lower: f64, upper: f64) -> (f64, f64) {
    if lower >= upper {
        (lower, lower + WINDOW_EPSILON)
    } else {
        (lower, upper)
    }
}

/// Builds the column name for a window.
#[must_use]
pub fn column_name(lower: f64, upper: f64) -> String {
    format!("{lower}{SEPARATOR}{upper}")
}

/// Returns true if `name` looks like a threshold column.
#[must_use]
pub fn is_threshold_column(name: &str) -> bool {
    name.contains(THRESHOLD_MARKER)
}

/// Parses the bounds back out of a threshold column name.
///
/// # Errors
/// Returns [`Error::Parse`] if the name is not `"<float> < x < <float>"`.
pub fn parse_column_name(name: &str) -> Result<(f64, f64)> {
    let parse_err = |reason: &str| Error::Parse {
        column: name.to_string(),
        reason: reason.to_string(),
    };

    let (lower, upper) = name
        .trim()
        .split_once(SEPARATOR)
        .ok_or_else(|| parse_err("missing ' < x < ' separator"))?;
    let lower: f64 = lower
        .trim()
        .parse()
        .map_err(|_| parse_err("lower bound is not a number"))?;
    let upper: f64 = upper
        .trim()
        .parse()
        .map_err(|_| parse_err("upper bound is not a number"))?;
    if !lower.is_finite() || !upper.is_finite() {
        return Err(parse_err("bounds must be finite"));
    }
    Ok((lower, upper))
}
