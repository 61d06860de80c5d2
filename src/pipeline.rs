// src/pipeline.rs

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info, instrument};

use crate::config::PipelineConfig;
use crate::fetch::fetch_feed;
use crate::model::run_model;
use crate::table::parse_feed_with_report;
use crate::transform::run_primary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StageOutcome {
    Ok,
    Failed(String),
    Skipped,
}

impl StageOutcome {
    fn failed(err: impl std::fmt::Display) -> Self {
        StageOutcome::Failed(err.to_string())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

/// What happened during one run, stage by stage.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub fetch: StageOutcome,
    pub parse: StageOutcome,
    pub rows_parsed: usize,
    pub lines_skipped: usize,
    pub primary: StageOutcome,
    pub primary_path: PathBuf,
    pub primary_rows: usize,
    pub model: StageOutcome,
    pub model_path: PathBuf,
    pub model_rows: usize,
    /// Columns asked to be removed that the feed did not have.
    pub absent_columns: Vec<String>,
}

impl PipelineReport {
    fn new(source: &str, config: &PipelineConfig) -> Self {
        Self {
            source: source.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            fetch: StageOutcome::Skipped,
            parse: StageOutcome::Skipped,
            rows_parsed: 0,
            lines_skipped: 0,
            primary: StageOutcome::Skipped,
            primary_path: config.output_file.clone(),
            primary_rows: 0,
            model: StageOutcome::Skipped,
            model_path: config.output_file_modified.clone(),
            model_rows: 0,
            absent_columns: Vec::new(),
        }
    }

    /// The feed was parsed and neither output failed.
    pub fn is_success(&self) -> bool {
        self.parse == StageOutcome::Ok
            && ![&self.fetch, &self.primary, &self.model]
                .iter()
                .any(|s| s.is_failed())
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}

/// Download the feed and produce both outputs.
///
/// A failed download ends the run; the two outputs are attempted
/// independently of each other.
#[instrument(level = "info", skip_all, fields(url = %config.feed_url))]
pub async fn run(client: &Client, config: &PipelineConfig) -> PipelineReport {
    let mut report = PipelineReport::new(&config.feed_url, config);

    let text = match fetch_feed(client, &config.feed_url).await {
        Ok(text) => {
            report.fetch = StageOutcome::Ok;
            text
        }
        Err(e) => {
            error!("{}", e);
            report.fetch = StageOutcome::failed(e);
            return report.finish();
        }
    };

    process_feed(&text, config, &mut report);
    report.finish()
}

/// Run everything after the download on an already fetched body.
pub fn run_on_text(text: &str, config: &PipelineConfig) -> PipelineReport {
    let mut report = PipelineReport::new("<text>", config);
    process_feed(text, config, &mut report);
    report.finish()
}

fn process_feed(text: &str, config: &PipelineConfig, report: &mut PipelineReport) {
    let (records, parsed) = match parse_feed_with_report(text) {
        Ok(ok) => ok,
        Err(e) => {
            error!("could not parse feed: {}", e);
            report.parse = StageOutcome::failed(e);
            return;
        }
    };
    report.parse = StageOutcome::Ok;
    report.rows_parsed = parsed.rows;
    report.lines_skipped = parsed.skipped_lines.len();

    // The model output is built from the parsed rows, not the filled and
    // uppercased copy, so the primary stage gets its own clone.
    match run_primary(records.clone(), &config.output_file, config.preview_rows) {
        Ok(rows) => {
            report.primary = StageOutcome::Ok;
            report.primary_rows = rows;
        }
        Err(e) => {
            error!("an error occurred: {}", e);
            report.primary = StageOutcome::failed(e);
        }
    }

    match run_model(&records, &config.output_file_modified, &config.columns_to_remove) {
        Ok(out) => {
            report.model = StageOutcome::Ok;
            report.model_rows = out.rows;
            report.absent_columns = out.absent;
        }
        Err(e) => {
            error!("{}", e);
            report.model = StageOutcome::failed(e);
        }
    }

    info!(
        primary_rows = report.primary_rows,
        model_rows = report.model_rows,
        "feed processed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::fetch::build_client;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,stockfeed=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn config_in(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            output_file: dir.join("transformed_file.csv"),
            output_file_modified: dir.join("transformed_file_modified.csv"),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn unparseable_body_skips_outputs() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let report = run_on_text("", &config_in(dir.path()));

        assert!(report.parse.is_failed());
        assert_eq!(report.primary, StageOutcome::Skipped);
        assert_eq!(report.model, StageOutcome::Skipped);
        assert!(!report.is_success());
        assert!(!dir.path().join("transformed_file.csv").exists());
        Ok(())
    }

    #[test]
    fn model_failure_does_not_stop_primary() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let report = run_on_text("SKU|Titel_DE\nab_1|x\n", &config_in(dir.path()));

        assert_eq!(report.primary, StageOutcome::Ok);
        assert_eq!(report.primary_rows, 1);
        assert!(report.model.is_failed());
        assert!(!report.is_success());
        assert_eq!(
            fs::read_to_string(dir.path().join("transformed_file.csv"))?,
            "SKU,Titel_DE,new_column\nAB_1,X,DEFAULT VALUE\n"
        );
        Ok(())
    }

    #[test]
    fn primary_failure_does_not_stop_model() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "")?;
        let config = PipelineConfig {
            output_file: blocker.join("transformed_file.csv"),
            ..config_in(dir.path())
        };

        let report = run_on_text("RECORD_TYPE|SKU\nMODEL|AB_12\n", &config);
        assert!(report.primary.is_failed());
        assert_eq!(report.model, StageOutcome::Ok);
        assert_eq!(report.model_rows, 1);
        Ok(())
    }

    #[test]
    fn report_serializes_stage_outcomes() -> Result<()> {
        let dir = tempdir()?;
        let report = run_on_text("RECORD_TYPE|SKU\nMODEL|AB_12\n", &config_in(dir.path()));
        let json: serde_json::Value = serde_json::to_value(&report)?;
        assert_eq!(json["parse"]["status"], "ok");
        assert_eq!(json["fetch"]["status"], "skipped");
        assert_eq!(json["model_rows"], 1);
        assert!(json["finished_at"].is_string());
        assert!(report.is_success());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_feed_short_circuits() -> Result<()> {
        let dir = tempdir()?;
        let config = PipelineConfig {
            // nothing listens on the discard port
            feed_url: "http://127.0.0.1:9/feed.csv".into(),
            fetch: FetchConfig {
                timeout: std::time::Duration::from_secs(5),
                ..FetchConfig::default()
            },
            ..config_in(dir.path())
        };
        let client = crate::fetch::client_builder(&config.fetch)
            .no_proxy()
            .build()?;

        let report = run(&client, &config).await;
        assert!(report.fetch.is_failed());
        assert_eq!(report.parse, StageOutcome::Skipped);
        assert!(!report.is_success());
        assert!(!dir.path().join("transformed_file.csv").exists());

        // the production client builds from the same settings
        build_client(&config.fetch)?;
        Ok(())
    }
}
