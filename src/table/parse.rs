use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use super::value::{is_na_token, is_number, Value};
use super::RecordSet;
use crate::error::ParseError;

pub const FEED_DELIMITER: u8 = b'|';
pub const FEED_QUOTE: u8 = b'"';

/// What the lenient parser kept and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub rows: usize,
    /// 1-based line numbers of data lines that were skipped.
    pub skipped_lines: Vec<u64>,
}

/// Parse a pipe-delimited feed body into a [`RecordSet`].
pub fn parse_feed(text: &str) -> Result<RecordSet, ParseError> {
    parse_feed_with_report(text).map(|(records, _)| records)
}

/// Parse a pipe-delimited feed body, skipping lines that do not match the
/// header's field count or cannot be read.
///
/// Columns whose every present value is numeric become [`Value::Number`];
/// everything else is kept as [`Value::Text`].
#[instrument(level = "info", skip(text), fields(bytes = text.len()))]
pub fn parse_feed_with_report(text: &str) -> Result<(RecordSet, ParseReport), ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut rdr = ReaderBuilder::new()
        .delimiter(FEED_DELIMITER)
        .quote(FEED_QUOTE)
        .double_quote(true)
        .has_headers(false)
        .flexible(true) // field-count mismatches are handled per line below
        .from_reader(text.as_bytes());
    let mut records = rdr.records();

    let header = loop {
        match records.next() {
            None => return Err(ParseError::Empty),
            Some(Err(e)) => return Err(ParseError::Header(e)),
            Some(Ok(rec)) if is_blank(&rec) => continue,
            Some(Ok(rec)) => break rec,
        }
    };
    let columns = header_names(&header);
    let width = columns.len();

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut report = ParseReport::default();

    for result in records {
        match result {
            Ok(rec) if is_blank(&rec) => {}
            Ok(rec) if rec.len() == width => raw_rows.push(rec.iter().map(cell).collect()),
            Ok(rec) => {
                let line = rec.position().map_or(0, |p| p.line());
                debug!(line, fields = rec.len(), expected = width, "skipping malformed line");
                report.skipped_lines.push(line);
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                debug!(line, error = %e, "skipping unreadable line");
                report.skipped_lines.push(line);
            }
        }
    }

    if !report.skipped_lines.is_empty() {
        warn!(skipped = report.skipped_lines.len(), "skipped malformed feed lines");
    }

    let records = into_typed(columns, raw_rows);
    report.rows = records.len();
    info!(rows = report.rows, columns = records.width(), "parsed feed");
    Ok((records, report))
}

fn is_blank(rec: &StringRecord) -> bool {
    rec.len() == 1 && rec[0].trim().is_empty()
}

fn cell(raw: &str) -> Option<String> {
    if is_na_token(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Header tokens become column names. Blank names get `Unnamed: <i>` and
/// repeats get a `.<n>` suffix so every name resolves to one column.
fn header_names(header: &StringRecord) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(header.len());
    for (i, token) in header.iter().enumerate() {
        let base = if token.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            token.to_string()
        };
        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

fn into_typed(columns: Vec<String>, raw_rows: Vec<Vec<Option<String>>>) -> RecordSet {
    let numeric: Vec<bool> = (0..columns.len())
        .map(|c| {
            let mut present = raw_rows.iter().filter_map(|r| r[c].as_deref()).peekable();
            present.peek().is_some() && present.all(is_number)
        })
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(c, raw)| match raw {
                    None => Value::Missing,
                    Some(v) if numeric[c] => Value::Number(v),
                    Some(v) => Value::Text(v),
                })
                .collect()
        })
        .collect();

    RecordSet { columns, rows }
}
