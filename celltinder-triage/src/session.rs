//! One triage session over a cell table.

use crate::navigation::Cursor;
use crate::selection::{active_subset, SelectionState};
use crate::threshold::{CellRecord, ThresholdTable};
use crate::{Error, Result};
use celltinder_core::threshold::clamp_bounds;
use celltinder_core::{ThresholdWindow, TriageConfig};
use celltinder_io::{CellImageSet, FrameLayout};
use std::path::Path;

/// Threshold, selection, and navigation state for one cell table.
///
/// A session works through the table in two phases: tune and commit a
/// ratio window, then step through the frozen subset marking cells to keep.
#[derive(Debug, Clone)]
pub struct TriageSession {
    config: TriageConfig,
    table: ThresholdTable,
    layout: FrameLayout,
    selection: SelectionState,
    cursor: Cursor,
}

impl TriageSession {
    /// Opens the table at `path`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the table cannot
    /// be loaded.
    pub fn open(path: &Path, config: TriageConfig) -> Result<Self> {
        config.crop.validate()?;
        let table = ThresholdTable::open(path, config.schema.clone())?;
        let layout = FrameLayout::for_table(path, &config.crop);
        Ok(Self {
            config,
            table,
            layout,
            selection: SelectionState::new(),
            cursor: Cursor::default(),
        })
    }

    /// Minimum and maximum finite ratio in the table.
    #[must_use]
    pub fn get_default_bounds(&self) -> (f64, f64) {
        self.table.default_bounds()
    }

    /// Number of cells whose ratio lies in the clamped window, bounds
    /// included.
    #[must_use]
    pub fn get_count(&self, lower: f64, upper: f64) -> usize {
        let (lower, upper) = clamp_bounds(lower, upper);
        self.table.count_in_range(lower, upper)
    }

    /// Commits a threshold window and freezes its subset for triage.
    ///
    /// Returns the new threshold column name.
    ///
    /// # Errors
    /// Returns an error for a non-finite bound or if the table cannot be
    /// written. The previous window and subset stay active on error.
    pub fn commit_window(&mut self, lower: f64, upper: f64) -> Result<String> {
        let len = self.selection.commit_window(&mut self.table, lower, upper)?.len();
        self.cursor = Cursor::new(len);
        Ok(self.table.active_column().unwrap_or_default().to_string())
    }

    /// Freezes the subset of the window restored from the table.
    ///
    /// Returns the subset length.
    ///
    /// # Errors
    /// Returns `InvalidState` if the table holds no committed window.
    pub fn begin_triage(&mut self) -> Result<usize> {
        let len = self.selection.begin(&mut self.table)?.len();
        self.cursor = Cursor::new(len);
        Ok(len)
    }

    /// Records of the active subset, sorted by ratio descending.
    ///
    /// # Errors
    /// Returns `InvalidState` if no window has been committed.
    pub fn get_active_subset(&self) -> Result<Vec<CellRecord>> {
        active_subset(&self.table)?
            .into_iter()
            .map(|row| self.table.record(row))
            .collect()
    }

    /// Record of subset position `index`.
    ///
    /// # Errors
    /// Returns `InvalidState` while idle and `IndexOutOfRange` past the end.
    pub fn cell_record(&self, index: usize) -> Result<CellRecord> {
        let row = self.selection.row(index)?;
        let mut record = self.table.record(row)?;
        record.kept = Some(self.selection.is_kept(&self.table, index)?);
        Ok(record)
    }

    /// Loads and crops every frame of subset position `index`.
    ///
    /// # Errors
    /// Returns [`Error::CellLoad`] if a frame is missing or unreadable.
    pub fn get_cell_image_set(&self, index: usize) -> Result<CellImageSet> {
        let record = self.table.record(self.selection.row(index)?)?;
        CellImageSet::build(
            record.centroid,
            &self.layout.image_base(&record.field_id),
            &self.layout.mask_base(&record.field_id),
            record.mask_label,
            &self.config.crop,
        )
        .map_err(|source| Error::CellLoad {
            index,
            field_id: record.field_id.clone(),
            mask_label: record.mask_label,
            source,
        })
    }

    /// Stages a keep/reject decision for subset position `index`.
    ///
    /// # Errors
    /// Returns `InvalidState` while idle and `IndexOutOfRange` past the end.
    pub fn mark_kept(&mut self, index: usize, kept: bool) -> Result<()> {
        self.selection.mark(index, kept)
    }

    /// Number of kept cells in the table, staged marks included.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection.selected_count(&self.table)
    }

    /// Writes staged decisions to the table file.
    ///
    /// Returns the number of decisions written.
    ///
    /// # Errors
    /// Returns `InvalidState` while idle, or an error if the table cannot be
    /// written.
    pub fn commit_selection(&mut self) -> Result<usize> {
        let written = self.selection.commit(&mut self.table)?;
        self.cursor = Cursor::default();
        Ok(written)
    }

    /// Advances to the next cell, wrapping to the first.
    pub fn next_cell(&mut self) -> usize {
        self.cursor.next()
    }

    /// Steps back to the previous cell, wrapping to the last.
    pub fn previous_cell(&mut self) -> usize {
        self.cursor.previous()
    }

    /// Moves to subset position `index`.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` for an empty subset. Indices past the end wrap.
    pub fn jump_to(&mut self, index: usize) -> Result<usize> {
        self.cursor.jump(index)
    }

    /// Current subset position.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor.index()
    }

    /// Number of cells in the frozen subset.
    #[must_use]
    pub fn subset_len(&self) -> usize {
        self.selection.len()
    }

    /// The current threshold window.
    #[must_use]
    pub fn window(&self) -> &ThresholdWindow {
        self.table.window()
    }

    /// The underlying threshold table.
    #[must_use]
    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &TriageConfig {
        &self.config
    }
}
