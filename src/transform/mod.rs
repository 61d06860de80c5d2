// src/transform/mod.rs

use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::TransformError;
use crate::output::write_csv;
use crate::table::{RecordSet, Value};

pub const NEW_COLUMN: &str = "new_column";
pub const DEFAULT_VALUE: &str = "DEFAULT VALUE";

/// Replace each missing cell with the closest earlier present value in the
/// same column. Leading missing cells stay missing. Returns the number of
/// cells filled.
pub fn forward_fill(records: &mut RecordSet) -> usize {
    let width = records.width();
    let rows = records.rows_mut();
    let mut filled = 0;

    for c in 0..width {
        let mut last: Option<usize> = None;
        for r in 0..rows.len() {
            if !rows[r][c].is_missing() {
                last = Some(r);
            } else if let Some(p) = last {
                rows[r][c] = rows[p][c].clone();
                filled += 1;
            }
        }
    }
    filled
}

/// Set `name` to the literal `value` on every row.
pub fn add_constant_column(records: &mut RecordSet, name: &str, value: &str) {
    records.set_column(name, |_| Value::text(value));
}

/// Uppercase every text cell. Numeric and missing cells are left alone, so
/// numeric columns keep their type.
pub fn uppercase_text_columns(records: &mut RecordSet) -> usize {
    let mut changed = 0;
    for v in records.rows_mut().iter_mut().flat_map(|r| r.iter_mut()) {
        if let Value::Text(s) = v {
            let upper = s.to_uppercase();
            if upper != *s {
                *s = upper;
                changed += 1;
            }
        }
    }
    changed
}

/// Fill, add `new_column`, uppercase. The order is fixed: the constant
/// column is added after the fill and is itself subject to uppercasing.
pub fn transform(mut records: RecordSet) -> RecordSet {
    let filled = forward_fill(&mut records);
    debug!(filled, "empty cells filled");

    add_constant_column(&mut records, NEW_COLUMN, DEFAULT_VALUE);

    let upper = uppercase_text_columns(&mut records);
    debug!(upper, "text uppercased");
    records
}

/// Transform the parsed feed and save it to `path`, logging a preview of
/// the data before and after. Returns the number of rows written.
#[instrument(level = "info", skip(records, path), fields(path = %path.display()))]
pub fn run_primary(
    records: RecordSet,
    path: &Path,
    preview_rows: usize,
) -> Result<usize, TransformError> {
    info!("first rows of the original feed:\n{}", records.preview(preview_rows));

    let transformed = transform(records);
    let rows = write_csv(&transformed, path)?;
    info!(rows, "transformed file saved");

    info!("first rows of the transformed feed:\n{}", transformed.preview(preview_rows));
    Ok(rows)
}
