//! Index navigation over a frozen subset.
#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use crate::{Error, Result};

/// A position in a subset of `len` cells that wraps at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    index: usize,
    len: usize,
}

impl Cursor {
    /// Creates a cursor at index 0.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Current index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Length of the subset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for an empty subset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Moves by `delta`, wrapping around, and returns the new index.
    pub fn step(&mut self, delta: i64) -> usize {
        if self.len > 0 {
            let len = self.len as i64;
            self.index = (self.index as i64 + delta).rem_euclid(len) as usize;
        }
        self.index
    }

    /// Moves to the next cell; the last wraps to the first.
    pub fn next(&mut self) -> usize {
        self.step(1)
    }

    /// Moves to the previous cell; the first wraps to the last.
    pub fn previous(&mut self) -> usize {
        self.step(-1)
    }

    /// Moves to `index`, wrapping past the end (`len` lands on 0).
    ///
    /// # Errors
    /// Returns [`Error::IndexOutOfRange`] for an empty subset.
    pub fn jump(&mut self, index: usize) -> Result<usize> {
        if self.len == 0 {
            return Err(Error::IndexOutOfRange { index, len: 0 });
        }
        self.index = index % self.len;
        Ok(self.index)
    }
}
