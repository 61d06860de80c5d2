use anyhow::{Context, Result};
use stockfeed::{config::PipelineConfig, fetch, pipeline};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockfeed=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configure ────────────────────────────────────────────────
    let config = PipelineConfig::default();
    config
        .validate()
        .context("invalid pipeline configuration")?;
    let client = fetch::build_client(&config.fetch).context("building HTTP client")?;

    // ─── 3) fetch, transform, write ──────────────────────────────────
    let report = pipeline::run(&client, &config).await;

    match serde_json::to_string(&report) {
        Ok(json) => info!(report = %json, "run summary"),
        Err(e) => warn!("could not serialise run summary: {}", e),
    }

    if !report.is_success() {
        error!("finished with failures");
        std::process::exit(1);
    }
    info!("all done");
    Ok(())
}
