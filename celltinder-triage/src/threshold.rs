//! Ratio thresholding over a persisted cell table.

use crate::{Error, Result};
use celltinder_core::threshold::{is_threshold_column, parse_column_name};
use celltinder_core::{Centroid, TableSchema, ThresholdWindow};
use celltinder_io::CellTable;
use std::path::{Path, PathBuf};

/// Typed view of one table row.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub row: usize,
    pub ratio: f64,
    pub centroid: Centroid,
    pub field_id: String,
    pub mask_label: u32,
    /// `None` until the flag column exists.
    pub kept: Option<bool>,
}

/// A cell table with a ratio column and at most one committed threshold
/// window.
#[derive(Debug, Clone)]
pub struct ThresholdTable {
    path: PathBuf,
    table: CellTable,
    schema: TableSchema,
    ratios: Vec<f64>,
    default_bounds: (f64, f64),
    window: ThresholdWindow,
}

impl ThresholdTable {
    /// Loads the table at `path` and restores any stored threshold window.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, a required column is
    /// missing, or the ratio or flag column holds invalid values.
    pub fn open(path: &Path, schema: TableSchema) -> Result<Self> {
        let table = CellTable::read_csv(path)?;
        log::info!("loaded {} cells from {}", table.len(), path.display());
        Self::from_table(path, table, schema)
    }

    /// Wraps an already loaded table that persists to `path`.
    ///
    /// # Errors
    /// See [`ThresholdTable::open`].
    pub fn from_table(path: &Path, mut table: CellTable, schema: TableSchema) -> Result<Self> {
        table.require_columns(schema.required())?;
        if table.has_column(&schema.flag) {
            table.convert_to_flags(&schema.flag)?;
        }
        let ratios = table.floats(&schema.ratio)?;
        let default_bounds = finite_bounds(&ratios);

        let mut this = Self {
            path: path.to_path_buf(),
            table,
            schema,
            ratios,
            default_bounds,
            window: ThresholdWindow::new(default_bounds.0, default_bounds.1),
        };
        this.restore_window_from_storage();
        Ok(this)
    }

    /// Minimum and maximum finite ratio, or `(0.0, 0.0)` if there is none.
    #[must_use]
    pub fn default_bounds(&self) -> (f64, f64) {
        self.default_bounds
    }

    /// Number of ratios in `lower..=upper`.
    #[must_use]
    pub fn count_in_range(&self, lower: f64, upper: f64) -> usize {
        self.ratios
            .iter()
            .filter(|&&r| lower <= r && r <= upper)
            .count()
    }

    /// Number of values of a numeric column in `lower..=upper`.
    ///
    /// # Errors
    /// Returns an error if the column is missing or not numeric.
    pub fn count_in_column(&self, column: &str, lower: f64, upper: f64) -> Result<usize> {
        Ok(self.rows_in_range(column, lower, upper)?.len())
    }

    /// Rows whose `column` value lies in `lower..=upper`, in table order.
    ///
    /// # Errors
    /// Returns an error if the column is missing or not numeric.
    pub fn rows_in_range(&self, column: &str, lower: f64, upper: f64) -> Result<Vec<usize>> {
        let values = self.table.floats(column)?;
        Ok(values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| lower <= v && v <= upper)
            .map(|(row, _)| row)
            .collect())
    }

    /// Stores `lower < ratio < upper` as the single threshold column,
    /// replacing any earlier one, and persists the table.
    ///
    /// Inverted bounds are clamped first. Returns the new column name. If
    /// the write fails the table and window are left as they were.
    ///
    /// # Errors
    /// Returns `InvalidWindow` for a non-finite bound, or an error if the
    /// table cannot be written.
    pub fn commit_window(&mut self, lower: f64, upper: f64) -> Result<String> {
        let window = ThresholdWindow::committed(lower, upper)?;
        let column = window.column.clone().unwrap_or_default();

        let mut next = self.table.clone();
        let removed = next.remove_columns_where(is_threshold_column);
        if !removed.is_empty() {
            log::debug!("removed threshold columns {removed:?}");
        }
        let flags = self
            .ratios
            .iter()
            .map(|&r| window.contains_strict(r))
            .collect();
        next.set_flags(&column, flags);
        self.replace_table(next)?;
        self.window = window;
        log::info!(
            "committed window '{column}' with {} active cells",
            self.active_rows()?.len()
        );
        Ok(column)
    }

    /// Adopts the threshold column stored in the table, if any, as the
    /// active window and returns its bounds.
    ///
    /// Without a readable stored column the window falls back to
    /// [`default_bounds`](Self::default_bounds) with no active column.
    pub fn restore_window_from_storage(&mut self) -> (f64, f64) {
        let stored = self
            .table
            .column_names()
            .find(|name| is_threshold_column(name))
            .map(str::to_string);

        let restored = stored.and_then(|name| match self.adopt_column(&name) {
            Ok(window) => Some(window),
            Err(e) => {
                log::warn!("ignoring stored threshold column: {e}");
                None
            }
        });

        self.window = match restored {
            Some(window) => {
                log::debug!(
                    "restored window {:?} from {}",
                    window.bounds(),
                    self.path.display()
                );
                window
            }
            None => ThresholdWindow::new(self.default_bounds.0, self.default_bounds.1),
        };
        self.window.bounds()
    }

    fn adopt_column(&mut self, name: &str) -> Result<ThresholdWindow> {
        let (lower, upper) = parse_column_name(name)?;
        self.table.convert_to_flags(name)?;
        Ok(ThresholdWindow {
            lower,
            upper,
            column: Some(name.to_string()),
        })
    }

    /// The current window.
    #[must_use]
    pub fn window(&self) -> &ThresholdWindow {
        &self.window
    }

    /// Name of the committed threshold column, if any.
    #[must_use]
    pub fn active_column(&self) -> Option<&str> {
        self.window.column.as_deref()
    }

    /// Rows flagged by the active threshold column, in table order.
    ///
    /// # Errors
    /// Returns `InvalidState` if no window has been committed.
    pub fn active_rows(&self) -> Result<Vec<usize>> {
        let column = self
            .active_column()
            .ok_or_else(|| Error::invalid_state("no threshold window has been committed"))?;
        let flags = self.table.flags(column)?;
        Ok(flags
            .iter()
            .enumerate()
            .filter(|&(_, &active)| active)
            .map(|(row, _)| row)
            .collect())
    }

    /// Reads one row as a [`CellRecord`].
    ///
    /// # Errors
    /// Returns an error if the row is out of range or holds invalid values.
    pub fn record(&self, row: usize) -> Result<CellRecord> {
        let schema = &self.schema;
        let label = self.table.integer_at(row, &schema.mask_label)?;
        let mask_label = u32::try_from(label).map_err(|_| celltinder_io::Error::InvalidValue {
            column: schema.mask_label.clone(),
            row,
            value: label.to_string(),
        })?;
        let kept = match self.table.flags(&schema.flag) {
            Ok(flags) => Some(flags[row]),
            Err(_) => None,
        };
        Ok(CellRecord {
            row,
            ratio: self.ratios[row],
            centroid: Centroid::new(
                self.coordinate(row, &schema.centroid_y)?,
                self.coordinate(row, &schema.centroid_x)?,
            ),
            field_id: self.table.text_at(row, &schema.field_id)?.to_string(),
            mask_label,
            kept,
        })
    }

    fn coordinate(&self, row: usize, column: &str) -> Result<f64> {
        let value = self.table.float_at(row, column)?;
        if value.is_finite() {
            return Ok(value);
        }
        Err(celltinder_io::Error::InvalidValue {
            column: column.to_string(),
            row,
            value: self.table.text_at(row, column)?.to_string(),
        }
        .into())
    }

    /// Ratio of every row, NaN for empty cells.
    #[must_use]
    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    /// Writes the whole table back to its file.
    ///
    /// # Errors
    /// Returns an error if the table cannot be written.
    pub fn save(&self) -> Result<()> {
        self.table.write_csv(&self.path)?;
        log::info!("saved {} cells to {}", self.table.len(), self.path.display());
        Ok(())
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The underlying table.
    #[must_use]
    pub fn table(&self) -> &CellTable {
        &self.table
    }

    /// Writes `table` to the file and only then adopts it.
    pub(crate) fn replace_table(&mut self, table: CellTable) -> Result<()> {
        table.write_csv(&self.path)?;
        self.table = table;
        log::info!("saved {} cells to {}", self.table.len(), self.path.display());
        Ok(())
    }

    pub(crate) fn table_mut(&mut self) -> &mut CellTable {
        &mut self.table
    }

    /// Column names in use.
    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// File the table persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn finite_bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })
        .unwrap_or((0.0, 0.0))
}
