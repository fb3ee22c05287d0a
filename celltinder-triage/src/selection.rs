//! Keep/reject selection over the active subset.
//!
//! A triage pass freezes the ratio-sorted active subset, stages one flag per
//! marked cell, and writes the staged flags into the table on commit:
//!
//! `Idle -> (commit_window | begin) -> SubsetFrozen -> (mark)* -> (commit) -> Idle`

use crate::threshold::ThresholdTable;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Rows of the active subset, sorted by ratio descending.
///
/// Ties keep table order.
///
/// # Errors
/// Returns `InvalidState` if no threshold window has been committed.
pub fn active_subset(table: &ThresholdTable) -> Result<Vec<usize>> {
    let mut rows = table.active_rows()?;
    let ratios = table.ratios();
    rows.sort_by(|&a, &b| ratios[b].total_cmp(&ratios[a]));
    Ok(rows)
}

/// Adds the flag column, all `false`, unless it already exists.
///
/// Returns true if the column was added.
pub fn ensure_flag_column(table: &mut ThresholdTable) -> bool {
    let flag = table.schema().flag.clone();
    if table.table().has_column(&flag) {
        return false;
    }
    let rows = table.len();
    table.table_mut().set_flags(&flag, vec![false; rows]);
    log::debug!("added flag column '{flag}'");
    true
}

#[derive(Debug, Clone)]
struct Frozen {
    rows: Vec<usize>,
    /// Staged flags keyed by table row.
    staged: BTreeMap<usize, bool>,
}

/// Triage state over one [`ThresholdTable`].
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    frozen: Option<Frozen>,
}

impl SelectionState {
    /// Creates an idle selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a subset is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Freezes the active subset of the committed window and makes sure the
    /// flag column exists. Staged marks of an earlier pass are discarded.
    ///
    /// # Errors
    /// Returns `InvalidState` if no threshold window has been committed.
    pub fn begin(&mut self, table: &mut ThresholdTable) -> Result<&[usize]> {
        let rows = active_subset(table)?;
        ensure_flag_column(table);
        self.discard("starting a new triage pass");
        log::info!("frozen subset of {} cells", rows.len());
        let frozen = self.frozen.insert(Frozen {
            rows,
            staged: BTreeMap::new(),
        });
        Ok(frozen.rows.as_slice())
    }

    /// Commits a new threshold window and freezes its subset.
    ///
    /// # Errors
    /// Returns an error if the window is rejected or the table cannot be
    /// written. The current subset and its staged marks survive the error.
    pub fn commit_window(
        &mut self,
        table: &mut ThresholdTable,
        lower: f64,
        upper: f64,
    ) -> Result<&[usize]> {
        table.commit_window(lower, upper)?;
        self.discard("committing a new threshold window");
        self.begin(table)
    }

    fn discard(&mut self, reason: &str) {
        if let Some(frozen) = self.frozen.take() {
            if !frozen.staged.is_empty() {
                log::warn!(
                    "discarding {} uncommitted marks: {reason}",
                    frozen.staged.len()
                );
            }
        }
    }

    fn frozen(&self) -> Result<&Frozen> {
        self.frozen
            .as_ref()
            .ok_or_else(|| Error::invalid_state("no triage subset is frozen"))
    }

    /// Table rows of the frozen subset, in navigation order.
    ///
    /// # Errors
    /// Returns `InvalidState` while idle.
    pub fn subset(&self) -> Result<&[usize]> {
        Ok(self.frozen()?.rows.as_slice())
    }

    /// Number of cells in the frozen subset, 0 while idle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frozen.as_ref().map_or(0, |f| f.rows.len())
    }

    /// Returns true if no cells are frozen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Table row of subset position `index`.
    ///
    /// # Errors
    /// Returns `InvalidState` while idle and `IndexOutOfRange` past the end.
    pub fn row(&self, index: usize) -> Result<usize> {
        let frozen = self.frozen()?;
        frozen
            .rows
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: frozen.rows.len(),
            })
    }

    /// Stages the flag of subset position `index`.
    ///
    /// # Errors
    /// Returns `InvalidState` while idle and `IndexOutOfRange` past the end.
    pub fn mark(&mut self, index: usize, kept: bool) -> Result<()> {
        let row = self.row(index)?;
        if let Some(frozen) = self.frozen.as_mut() {
            frozen.staged.insert(row, kept);
        }
        Ok(())
    }

    /// Flag of subset position `index`, staged or stored.
    ///
    /// # Errors
    /// Returns `InvalidState` while idle and `IndexOutOfRange` past the end.
    pub fn is_kept(&self, table: &ThresholdTable, index: usize) -> Result<bool> {
        let row = self.row(index)?;
        if let Some(&kept) = self.frozen()?.staged.get(&row) {
            return Ok(kept);
        }
        Ok(stored_flags(table).is_some_and(|flags| flags[row]))
    }

    /// Number of kept cells across the whole table, counting staged marks.
    #[must_use]
    pub fn selected_count(&self, table: &ThresholdTable) -> usize {
        let mut flags =
            stored_flags(table).map_or_else(|| vec![false; table.len()], <[bool]>::to_vec);
        if let Some(frozen) = &self.frozen {
            for (&row, &kept) in &frozen.staged {
                flags[row] = kept;
            }
        }
        flags.iter().filter(|&&kept| kept).count()
    }

    /// Writes the staged flags into the table, persists it, and returns to
    /// idle. Returns the number of flags written.
    ///
    /// # Errors
    /// Returns `InvalidState` while idle, or an error if the table cannot be
    /// written. On a write error the table is unchanged and the staged marks
    /// are kept.
    pub fn commit(&mut self, table: &mut ThresholdTable) -> Result<usize> {
        let staged = &self.frozen()?.staged;
        let flag = &table.schema().flag;
        let mut next = table.table().clone();
        if !next.has_column(flag) {
            next.set_flags(flag, vec![false; next.len()]);
        }
        let flags = next.flags_mut(flag)?;
        for (&row, &kept) in staged {
            flags[row] = kept;
        }
        let written = staged.len();
        table.replace_table(next)?;
        self.frozen = None;
        log::info!("committed {written} triage marks");
        Ok(written)
    }
}

fn stored_flags(table: &ThresholdTable) -> Option<&[bool]> {
    table.table().flags(&table.schema().flag).ok()
}
