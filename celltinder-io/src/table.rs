//! Column-oriented cell table backed by a CSV file.
//!
//! Columns keep the text they were read with, so untouched columns are
//! written back unchanged. Columns whose every value is `true`/`false` (any
//! letter case) are held as flags and written as `True`/`False`.

use crate::{Error, Result};
use std::io::{Read, Write};
use std::path::Path;

/// Values of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Raw text, parsed on access.
    Text(Vec<String>),
    /// Boolean flags.
    Flags(Vec<bool>),
}

impl ColumnData {
    fn render(&self, row: usize) -> String {
        match self {
            Self::Text(values) => values[row].clone(),
            Self::Flags(values) => render_flag(values[row]).to_string(),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// An in-memory cell table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellTable {
    columns: Vec<Column>,
    rows: usize,
}

impl CellTable {
    /// Reads a table from a CSV file with a header row.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the file does not exist, or an error if
    /// it cannot be parsed.
    pub fn read_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads a table from any CSV source.
    ///
    /// # Errors
    /// Returns an error if the CSV is malformed or rows have differing lengths.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut values: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut rows = 0usize;
        for record in rdr.records() {
            let record = record?;
            for (column, field) in values.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
            rows += 1;
        }

        let columns = headers
            .into_iter()
            .zip(values)
            .map(|(name, values)| Column {
                name,
                data: infer_column(values),
            })
            .collect();
        Ok(Self { columns, rows })
    }

    /// Writes the table to `path` through a temporary file in the same
    /// directory, renamed over the target once complete.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be written or renamed.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        self.to_writer(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        log::debug!("wrote {} rows to {}", self.rows, path.display());
        Ok(())
    }

    /// Writes the table as CSV to any sink.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.columns.iter().map(|c| c.name.as_str()))?;
        for row in 0..self.rows {
            wtr.write_record(self.columns.iter().map(|c| c.data.render(row)))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Builds a table from `(name, values)` text columns.
    ///
    /// # Panics
    /// Panics if the columns have different lengths.
    #[must_use]
    pub fn from_columns(columns: Vec<(&str, Vec<String>)>) -> Self {
        let rows = columns.first().map_or(0, |(_, values)| values.len());
        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                assert_eq!(values.len(), rows, "column '{name}' has the wrong length");
                Column {
                    name: name.to_string(),
                    data: infer_column(values),
                }
            })
            .collect();
        Self { columns, rows }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns true if a column with this name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.rows {
            return Err(Error::RowOutOfRange {
                row,
                len: self.rows,
            });
        }
        Ok(())
    }

    /// Parses a whole column as floats. Empty cells become NaN.
    ///
    /// # Errors
    /// Returns an error if the column is missing, holds flags, or a value is
    /// not a number.
    pub fn floats(&self, name: &str) -> Result<Vec<f64>> {
        (0..self.rows).map(|row| self.float_at(row, name)).collect()
    }

    /// Parses one cell as a float. Empty cells become NaN.
    ///
    /// # Errors
    /// Returns an error if the column or row is missing or the value is not a
    /// number.
    pub fn float_at(&self, row: usize, name: &str) -> Result<f64> {
        let text = self.text_at(row, name)?;
        parse_float(text).ok_or_else(|| invalid(name, row, text))
    }

    /// Parses one cell as an integer. Integral floats such as `3.0` are
    /// accepted.
    ///
    /// # Errors
    /// Returns an error if the column or row is missing or the value is not an
    /// integer.
    pub fn integer_at(&self, row: usize, name: &str) -> Result<i64> {
        let text = self.text_at(row, name)?;
        parse_integer(text).ok_or_else(|| invalid(name, row, text))
    }

    /// Returns the raw text of one cell.
    ///
    /// # Errors
    /// Returns an error if the column or row is missing, or the column holds
    /// flags.
    pub fn text_at(&self, row: usize, name: &str) -> Result<&str> {
        self.check_row(row)?;
        match &self.require(name)?.data {
            ColumnData::Text(values) => Ok(values[row].as_str()),
            ColumnData::Flags(values) => Err(invalid(name, row, render_flag(values[row]))),
        }
    }

    /// Renders any cell as it would be written to CSV.
    #[must_use]
    pub fn display_at(&self, row: usize, name: &str) -> Option<String> {
        if row >= self.rows {
            return None;
        }
        self.column(name).map(|c| c.data.render(row))
    }

    /// Returns a flag column.
    ///
    /// # Errors
    /// Returns an error if the column is missing or does not hold flags.
    pub fn flags(&self, name: &str) -> Result<&[bool]> {
        match &self.require(name)?.data {
            ColumnData::Flags(values) => Ok(values.as_slice()),
            ColumnData::Text(values) => Err(invalid(
                name,
                0,
                values.first().map_or("", String::as_str),
            )),
        }
    }

    /// Returns a flag column for in-place edits.
    ///
    /// # Errors
    /// Returns an error if the column is missing or does not hold flags.
    pub fn flags_mut(&mut self, name: &str) -> Result<&mut [bool]> {
        let column = self
            .column_mut(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        match &mut column.data {
            ColumnData::Flags(values) => Ok(values.as_mut_slice()),
            ColumnData::Text(values) => Err(invalid(
                name,
                0,
                values.first().map_or("", String::as_str),
            )),
        }
    }

    /// Converts a text column to flags, treating empty cells as `false`.
    /// Flag columns are left untouched.
    ///
    /// # Errors
    /// Returns an error if the column is missing or a value is not a boolean.
    pub fn convert_to_flags(&mut self, name: &str) -> Result<()> {
        let column = self
            .column_mut(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))?;
        if let ColumnData::Text(values) = &column.data {
            let flags = values
                .iter()
                .enumerate()
                .map(|(row, text)| {
                    if text.trim().is_empty() {
                        Ok(false)
                    } else {
                        parse_flag(text).ok_or_else(|| invalid(name, row, text))
                    }
                })
                .collect::<Result<Vec<bool>>>()?;
            column.data = ColumnData::Flags(flags);
        }
        Ok(())
    }

    /// Appends a flag column, or replaces the values of an existing one.
    ///
    /// # Panics
    /// Panics if `values` does not have one entry per row.
    pub fn set_flags(&mut self, name: &str, values: Vec<bool>) {
        assert_eq!(values.len(), self.rows, "flag column '{name}' has the wrong length");
        let data = ColumnData::Flags(values);
        match self.column_mut(name) {
            Some(column) => column.data = data,
            None => self.columns.push(Column {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Removes every column whose name matches `predicate` and returns the
    /// removed names.
    pub fn remove_columns_where<F>(&mut self, mut predicate: F) -> Vec<String>
    where
        F: FnMut(&str) -> bool,
    {
        let mut removed = Vec::new();
        self.columns.retain(|c| {
            if predicate(&c.name) {
                removed.push(c.name.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Checks that every named column exists.
    ///
    /// # Errors
    /// Returns [`Error::MissingColumn`] for the first absent column.
    pub fn require_columns<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            self.require(name)?;
        }
        Ok(())
    }
}

fn infer_column(values: Vec<String>) -> ColumnData {
    if values.is_empty() {
        return ColumnData::Text(values);
    }
    match values.iter().map(|v| parse_flag(v)).collect::<Option<Vec<bool>>>() {
        Some(flags) => ColumnData::Flags(flags),
        None => ColumnData::Text(values),
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn render_flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(f64::NAN);
    }
    text.parse().ok()
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    let value: f64 = text.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(value as i64)
    } else {
        None
    }
}

fn invalid(column: &str, row: usize, value: &str) -> Error {
    Error::InvalidValue {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}
