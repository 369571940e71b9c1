//! Patent search REST API client.
//!
//! Thin wrapper over `reqwest` for the three endpoints the application uses.
//! Every endpoint answers with the same JSON envelope:
//!
//! ```json
//! {"status": true, "data": {...}, "error_msg": null, "error_code": null}
//! ```
//!
//! API Details:
//! - `POST /token` exchanges client id/secret for a bearer token
//! - `POST /api/v1/search/patents` runs a free-text search (bare hits only)
//! - `POST /api/v1/search/bibliography` expands hits into full records
//! - Search endpoints need `Authorization: Bearer <token>` and an `apikey` query parameter

use crate::config::ClientConfig;
use crate::error::{PatsearchError, Result};
use crate::patent::BibliographicRecord;
use crate::store::Session;
use reqwest::{Client, Response};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// `error_code` the API uses for an invalid or expired token/apikey
pub const AUTH_EXPIRED_CODE: i64 = 67200003;

const TOKEN_PATH: &str = "token";
const PATENTS_PATH: &str = "api/v1/search/patents";
const BIBLIOGRAPHY_PATH: &str = "api/v1/search/bibliography";

/// Response envelope shared by all endpoints
///
/// Failure envelopes often carry `null`, `{}` or `""` as `data`; those read
/// as `None`. Any other `data` must decode as `T`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Envelope<T> {
    pub status: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<T>,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let placeholder = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    };
    if placeholder {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some).map_err(D::Error::custom)
}

impl<T> Envelope<T> {
    /// Server message, or a generic one when the API sent none
    pub fn error_message(&self) -> String {
        self.error_msg
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    /// True when the error code signals an invalid or expired session
    pub fn is_auth_expired(&self) -> bool {
        self.error_code == Some(AUTH_EXPIRED_CODE)
    }

    /// Payload of a successful envelope; `status=false` becomes
    /// [`PatsearchError::AuthExpired`] or [`PatsearchError::Api`]
    pub fn into_data(self) -> Result<T> {
        if !self.status {
            let message = self.error_message();
            return Err(if self.is_auth_expired() {
                PatsearchError::AuthExpired { message }
            } else {
                PatsearchError::Api {
                    code: self.error_code.unwrap_or_default(),
                    message,
                }
            });
        }
        self.data.ok_or_else(|| PatsearchError::Api {
            code: 0,
            message: "Response did not include data".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

/// Payload of a successful `POST /token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenData {
    pub token: String,
}

#[derive(Debug, Serialize)]
struct PatentSearchRequest<'a> {
    query_text: &'a str,
    limit: u32,
    offset: u64,
}

/// Payload of a successful `POST /api/v1/search/patents`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatentSearchData {
    #[serde(default)]
    pub total_search_result_count: u64,
    #[serde(default)]
    pub results: Vec<PatentHit>,
}

/// Bare search hit; only the id is used, the rest comes from enrichment
#[derive(Debug, Clone, Deserialize)]
pub struct PatentHit {
    pub patent_id: String,
}

impl PatentSearchData {
    /// Hit ids in result order, comma-joined for the bibliography call
    pub fn joined_ids(&self) -> String {
        self.results
            .iter()
            .map(|p| p.patent_id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Client for the patent search API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Build a client from configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PatsearchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Exchange client credentials for a bearer token
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Envelope<TokenData>> {
        let url = self.config.endpoint(TOKEN_PATH)?;
        debug!(url = %url, client_id = client_id, "Requesting token");

        let response = self
            .client
            .post(url)
            .json(&TokenRequest {
                client_id,
                client_secret,
            })
            .send()
            .await?;

        read_envelope(response).await
    }

    /// Run a free-text search for one page of hits
    pub async fn search_patents(
        &self,
        session: &Session,
        query_text: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Envelope<PatentSearchData>> {
        let url = self.config.endpoint(PATENTS_PATH)?;
        debug!(url = %url, query = query_text, limit = limit, offset = offset, "Searching patents");

        let response = self
            .client
            .post(url)
            .query(&[("apikey", session.apikey.as_str())])
            .bearer_auth(&session.token)
            .json(&PatentSearchRequest {
                query_text,
                limit,
                offset,
            })
            .send()
            .await?;

        read_envelope(response).await
    }

    /// Fetch full bibliographic records for comma-joined patent ids
    pub async fn search_bibliography(
        &self,
        session: &Session,
        patent_ids: &str,
    ) -> Result<Envelope<Vec<BibliographicRecord>>> {
        let url = self.config.endpoint(BIBLIOGRAPHY_PATH)?;
        debug!(url = %url, patent_ids = patent_ids, "Fetching bibliography");

        let response = self
            .client
            .post(url)
            .query(&[
                ("apikey", session.apikey.as_str()),
                ("patent_id", patent_ids),
            ])
            .bearer_auth(&session.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        read_envelope(response).await
    }
}

/// Decode an envelope, accepting it on any HTTP status as long as it parses
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<Envelope<T>>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(e) if status.is_success() => {
            warn!(error = %e, "Malformed API response");
            Err(e.into())
        }
        Err(_) => {
            warn!(status = status.as_u16(), "API error without envelope");
            Err(PatsearchError::Http {
                status: status.as_u16(),
                message: body.trim().to_string(),
            })
        }
    }
}
