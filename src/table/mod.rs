// src/table/mod.rs
pub mod parse;
pub mod value;

pub use parse::{parse_feed, parse_feed_with_report, ParseReport};
pub use value::Value;

use std::fmt;

/// Rows of a feed, held fully in memory.
///
/// Every row has exactly one [`Value`] per column; a missing cell is
/// [`Value::Missing`], never a short row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a record set from rows that already match `columns`.
    #[cfg(test)]
    pub(crate) fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        assert!(
            rows.iter().all(|r| r.len() == columns.len()),
            "every row needs one value per column"
        );
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Mutable access to cells; the slice keeps the row count fixed.
    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Value>] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Values of one column in row order.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Set `name` on every row to `f(row)`. Appends the column when it is new,
    /// overwrites it otherwise.
    pub fn set_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(&[Value]) -> Value,
    {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    let v = f(row);
                    row[idx] = v;
                }
            }
            None => {
                for row in &mut self.rows {
                    let v = f(row);
                    row.push(v);
                }
                self.columns.push(name.to_string());
            }
        }
    }

    /// Remove a column; returns false when it was not present.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Copy of the rows for which `keep` returns true, in their original order.
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Printable table of the first `n` rows, for logs.
    pub fn preview(&self, n: usize) -> Preview<'_> {
        Preview { set: self, rows: n }
    }
}

const PREVIEW_CELL_WIDTH: usize = 24;

pub struct Preview<'a> {
    set: &'a RecordSet,
    rows: usize,
}

fn clip(s: &str) -> String {
    if s.chars().count() <= PREVIEW_CELL_WIDTH {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(PREVIEW_CELL_WIDTH - 3).collect();
        out.push_str("...");
        out
    }
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = &self.set.rows[..self.rows.min(self.set.len())];
        let header: Vec<String> = self.set.columns.iter().map(|c| clip(c)).collect();
        let body: Vec<Vec<String>> = shown
            .iter()
            .map(|r| r.iter().map(|v| clip(&v.to_string())).collect())
            .collect();

        let index_width = shown.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| {
                body.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:w$}", "", w = index_width)?;
        for (h, w) in header.iter().zip(&widths) {
            write!(f, "  {:<w$}", h, w = *w)?;
        }
        for (i, row) in body.iter().enumerate() {
            write!(f, "\n{:>w$}", i, w = index_width)?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {:<w$}", cell, w = *w)?;
            }
        }
        if shown.is_empty() {
            f.write_str("\n(no rows)")?;
        }
        Ok(())
    }
}
