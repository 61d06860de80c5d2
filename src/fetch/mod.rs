// src/fetch/mod.rs

use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;

pub(crate) fn client_builder(cfg: &FetchConfig) -> ClientBuilder {
    Client::builder()
        .user_agent(cfg.user_agent.as_str())
        .timeout(cfg.timeout)
}

/// HTTP client carrying the browser `User-Agent` the feed host expects,
/// with a bounded request timeout.
pub fn build_client(cfg: &FetchConfig) -> Result<Client, FetchError> {
    client_builder(cfg).build().map_err(FetchError::Client)
}

/// Download the feed body. Only `200 OK` counts as success; there are no retries.
#[instrument(level = "info", skip(client))]
pub async fn fetch_feed(client: &Client, url: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    debug!("requesting feed");
    let transport = |source: reqwest::Error| FetchError::Transport {
        url: url.to_string(),
        source,
    };
    let resp = client.get(parsed).send().await.map_err(transport)?;

    let status = resp.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            status_code: status.as_u16(),
        });
    }

    let body = resp.text().await.map_err(transport)?;
    info!(bytes = body.len(), "feed downloaded");
    Ok(body)
}
