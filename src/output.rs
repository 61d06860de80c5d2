// src/output.rs

use csv::WriterBuilder;
use std::{
    borrow::Cow,
    ffi::OsString,
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::WriteError;
use crate::table::RecordSet;

/// Write `records` as comma-delimited CSV with a header row and no index column.
///
/// Data goes to a hidden sibling file first and is renamed over `path`, so a
/// failed write never leaves a truncated output behind. An existing `path`
/// that is read-only or cannot be opened for writing is refused up front,
/// since the rename alone would replace it regardless. Returns the number of
/// data rows written.
pub fn write_csv(records: &RecordSet, path: &Path) -> Result<usize, WriteError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| WriteError::from_io(path, e))?;
    }
    ensure_writable(path).map_err(|e| WriteError::from_io(path, e))?;

    let tmp_path = tmp_path_for(path);
    let result = write_records(records, &tmp_path, path).and_then(|rows| {
        fs::rename(&tmp_path, path).map_err(|e| WriteError::from_io(path, e))?;
        Ok(rows)
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn ensure_writable(path: &Path) -> io::Result<()> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if meta.permissions().readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "target file is read-only",
        ));
    }
    if meta.is_file() {
        OpenOptions::new().write(true).open(path)?;
    }
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| path.as_os_str()));
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_records(records: &RecordSet, tmp_path: &Path, target: &Path) -> Result<usize, WriteError> {
    let file = File::create(tmp_path).map_err(|e| WriteError::from_io(target, e))?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    wtr.write_record(records.columns())
        .map_err(|e| WriteError::from_csv(target, e))?;
    for row in records.rows() {
        let fields: Vec<Cow<'_, str>> = row.iter().map(|v| v.to_field()).collect();
        wtr.write_record(fields.iter().map(|f| f.as_bytes()))
            .map_err(|e| WriteError::from_csv(target, e))?;
    }
    wtr.flush().map_err(|e| WriteError::from_io(target, e))?;

    debug!(rows = records.len(), tmp = %tmp_path.display(), "csv written");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use anyhow::Result;
    use tempfile::tempdir;

    fn sample() -> RecordSet {
        RecordSet::from_rows(
            vec!["SKU".into(), "PRICE".into(), "NOTE".into()],
            vec![
                vec![Value::text("AB_12"), Value::number("10"), Value::Missing],
                vec![Value::text("a,b"), Value::number("2.5"), Value::text("x")],
            ],
        )
    }

    #[test]
    fn writes_header_rows_and_quotes() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("out.csv");

        let rows = write_csv(&sample(), &path)?;
        assert_eq!(rows, 2);
        assert_eq!(
            fs::read_to_string(&path)?,
            "SKU,PRICE,NOTE\nAB_12,10,\n\"a,b\",2.5,x\n"
        );
        assert!(!tmp_path_for(&path).exists());
        Ok(())
    }

    #[test]
    fn overwrites_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        fs::write(&path, "old contents")?;

        write_csv(&RecordSet::new(vec!["A".into()]), &path)?;
        assert_eq!(fs::read_to_string(&path)?, "A\n");
        Ok(())
    }

    #[test]
    fn read_only_target_is_permission_denied() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("transformed_file_modified.csv");
        fs::write(&path, "locked")?;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms.clone())?;

        let result = write_csv(&sample(), &path);
        let contents = fs::read_to_string(&path)?;
        perms.set_readonly(false);
        fs::set_permissions(&path, perms)?;

        let err = result.unwrap_err();
        assert!(err.is_permission_denied());
        assert!(err.to_string().contains("write permissions"));
        assert_eq!(contents, "locked");
        assert!(!tmp_path_for(&path).exists());
        Ok(())
    }

    #[test]
    fn unwritable_location_is_a_generic_write_error() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory")?;

        let err = write_csv(&sample(), &blocker.join("out.csv")).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
        Ok(())
    }
}
