// src/error.rs

use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Downloading the feed failed. Nothing downstream can run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid feed URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to download the file, status code: {status_code}")]
    Status { status_code: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// The body could not be turned into a record set at all.
/// Individual malformed lines are skipped, not reported here.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("feed body is empty or has no header row")]
    Empty,

    #[error("unreadable header row: {0}")]
    Header(#[source] csv::Error),
}

/// Saving an output file failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(
        "permission denied: could not save '{}'. Make sure the file is not open in another \
         program and that you have write permissions to the directory",
        .path.display()
    )]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("an error occurred while saving '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not encode CSV for '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl WriteError {
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::PermissionDenied => WriteError::PermissionDenied { path, source },
            _ => WriteError::Io { path, source },
        }
    }

    /// csv wraps I/O failures; route them through [`WriteError::from_io`] so
    /// a locked file is still reported as a permission problem.
    pub fn from_csv(path: &Path, source: csv::Error) -> Self {
        let io_kind = match source.kind() {
            csv::ErrorKind::Io(err) => Some(err.kind()),
            _ => None,
        };
        match io_kind {
            Some(kind) => Self::from_io(path, io::Error::new(kind, source)),
            None => WriteError::Csv {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, WriteError::PermissionDenied { .. })
    }
}

/// A transform/derive step could not produce its output.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("column '{0}' not found in record set")]
    MissingColumn(String),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Pipeline settings that cannot work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid feed URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("feed URL must be http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("both outputs point at '{}'", .0.display())]
    SameOutput(PathBuf),
}
