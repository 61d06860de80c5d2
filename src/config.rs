// src/config.rs

use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::error::ConfigError;
use crate::model::LOCALE_COLUMNS;

/// The product feed this crate exists to process.
pub const FEED_URL: &str = "https://feed.stockfirmati.com/csv/exportdropclang.csv";

pub const OUTPUT_FILE: &str = "transformed_file.csv";
pub const OUTPUT_FILE_MODIFIED: &str = "transformed_file_modified.csv";

/// The feed host turns away clients without a browser-like identity.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout: FETCH_TIMEOUT,
        }
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub feed_url: String,
    /// Fully transformed copy of the feed.
    pub output_file: PathBuf,
    /// MODEL rows with the locale columns removed.
    pub output_file_modified: PathBuf,
    pub columns_to_remove: Vec<String>,
    pub fetch: FetchConfig,
    /// Rows shown in the before/after log previews.
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feed_url: FEED_URL.to_string(),
            output_file: PathBuf::from(OUTPUT_FILE),
            output_file_modified: PathBuf::from(OUTPUT_FILE_MODIFIED),
            columns_to_remove: LOCALE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            fetch: FetchConfig::default(),
            preview_rows: PREVIEW_ROWS,
        }
    }
}

impl PipelineConfig {
    /// Check the settings before any network or disk work starts.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.feed_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.feed_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }
        if self.output_file == self.output_file_modified {
            return Err(ConfigError::SameOutput(self.output_file.clone()));
        }
        Ok(url)
    }
}
