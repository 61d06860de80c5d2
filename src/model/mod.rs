// src/model/mod.rs

use std::path::Path;
use tracing::{info, instrument, warn};

use crate::error::TransformError;
use crate::output::write_csv;
use crate::table::{RecordSet, Value};

pub const RECORD_TYPE: &str = "RECORD_TYPE";
pub const MODEL: &str = "MODEL";
pub const SKU: &str = "SKU";
pub const VEZNIK: &str = "VEZNIK";

/// Per-locale title/description columns dropped from the model output.
pub const LOCALE_COLUMNS: [&str; 20] = [
    "Titel_ITA",
    "Description_ITA",
    "Titel_ES",
    "Description_ES",
    "Titel_FR",
    "Description_FR",
    "Titel_DE",
    "Description_DE",
    "Titel_BG",
    "Description_BG",
    "Titel_PL",
    "Description_PL",
    "Titel_CZ",
    "Description_CZ",
    "Titel_SK",
    "Description_SK",
    "Titel_HU",
    "Description_HU",
    "Titel_RO",
    "Description_RO",
];

/// Rows whose `RECORD_TYPE` is exactly `MODEL`.
pub fn filter_model(records: &RecordSet) -> Result<RecordSet, TransformError> {
    let idx = records
        .column_index(RECORD_TYPE)
        .ok_or_else(|| TransformError::MissingColumn(RECORD_TYPE.to_string()))?;
    Ok(records.filter_rows(|row| row[idx].as_text() == Some(MODEL)))
}

/// The SKU prefix before the first `_`, then before the first `-` of that.
pub fn veznik(sku: &str) -> &str {
    let head = sku.split_once('_').map_or(sku, |(left, _)| left);
    head.split_once('-').map_or(head, |(left, _)| left)
}

/// Set `VEZNIK` on every row from the textual form of `SKU`.
/// A missing SKU is read as `nan`.
pub fn derive_veznik(records: &mut RecordSet) -> Result<(), TransformError> {
    let idx = records
        .column_index(SKU)
        .ok_or_else(|| TransformError::MissingColumn(SKU.to_string()))?;
    records.set_column(VEZNIK, |row| Value::text(veznik(&row[idx].to_text())));
    Ok(())
}

#[derive(Debug)]
pub struct PruneOutcome {
    pub records: RecordSet,
    /// Requested names that were not columns of the input.
    pub absent: Vec<String>,
}

/// Drop the named columns. Names that do not exist are reported, not errors.
pub fn prune<S: AsRef<str>>(mut records: RecordSet, columns: &[S]) -> PruneOutcome {
    let absent: Vec<String> = columns
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|name| !records.drop_column(name))
        .map(str::to_string)
        .collect();
    if !absent.is_empty() {
        warn!(absent = ?absent, "columns to remove were not in the feed");
    }
    PruneOutcome { records, absent }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutput {
    pub rows: usize,
    pub absent: Vec<String>,
}

/// Filter MODEL rows, derive `VEZNIK`, drop `columns`, and save to `path`.
#[instrument(level = "info", skip(records, path, columns), fields(path = %path.display()))]
pub fn run_model<S: AsRef<str>>(
    records: &RecordSet,
    path: &Path,
    columns: &[S],
) -> Result<ModelOutput, TransformError> {
    let mut model = filter_model(records)?;
    info!(kept = model.len(), of = records.len(), "filtered MODEL rows");

    derive_veznik(&mut model)?;
    info!("VEZNIK column added");

    let PruneOutcome { records: pruned, absent } = prune(model, columns);
    let rows = write_csv(&pruned, path)?;
    info!(rows, "modified file saved");
    Ok(ModelOutput { rows, absent })
}
