//! Client configuration.
//!
//! A single base URL is all the remote API needs; timeout and user agent
//! are optional knobs for the underlying `reqwest::Client`.

use crate::error::{PatsearchError, Result};
use std::time::Duration;
use url::Url;

/// Base URL used when neither `--api-url` nor `PATSEARCH_API_URL` is set
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// User agent string for requests
const USER_AGENT: &str = concat!("rustpatsearch/", env!("CARGO_PKG_VERSION"));

/// Settings consumed by [`crate::client::ApiClient`] at startup
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; always ends with `/` so relative endpoint joins keep any path prefix
    pub base_url: Url,
    /// Per-request timeout, `None` leaves requests unbounded
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl ClientConfig {
    /// Parse a base URL string into a config with default settings
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: None,
            user_agent: USER_AGENT.to_string(),
        })
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve an endpoint path (e.g. `api/v1/search/patents`) against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

/// Validate the scheme and make sure the path ends with a slash
fn normalize_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PatsearchError::Config("API base URL is empty".to_string()));
    }

    let mut url = Url::parse(raw)?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(PatsearchError::Config(format!(
            "Unsupported URL scheme: {}",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
