//! Loading export files from disk or over HTTP(S).

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use tracing::{debug, info};

use crate::errors::{EtlError, EtlResult};
use auth::ApiKey;

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> EtlResult<Vec<u8>> {
    let fetch_err = |reason: String| EtlError::Fetch {
        source_ref: url.to_string(),
        reason,
    };

    let parsed = url.parse().map_err(|e: url::ParseError| fetch_err(e.to_string()))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await.map_err(|e| fetch_err(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(fetch_err(format!("server returned status {status}")));
    }
    let bytes = resp.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
    Ok(bytes.to_vec())
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Reads `source` from a local path, or downloads it when it is an HTTP(S)
/// URL. A `token` is sent as a bearer token on remote requests.
#[tracing::instrument(skip(source, token), fields(source = %source))]
pub async fn read_source(source: &str, token: Option<&str>) -> EtlResult<Vec<u8>> {
    let bytes = if is_remote(source) {
        let client = BasicClient::new()?;
        match token {
            Some(token) => fetch_bytes(&ApiKey::bearer(client, token)?, source).await?,
            None => fetch_bytes(&client, source).await?,
        }
    } else {
        debug!("Reading local file");
        std::fs::read(source)?
    };
    info!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}
