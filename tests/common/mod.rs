//! In-process stand-in for the remote patent search API.

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use rustpatsearch::client::ApiClient;
use rustpatsearch::config::ClientConfig;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const CLIENT_ID: &str = "client-a";
pub const CLIENT_SECRET: &str = "s3cret";
pub const TOKEN: &str = "tok-123";
pub const EXPIRED_CODE: i64 = 67200003;

/// A request the mock received
#[derive(Debug, Clone)]
pub struct Call {
    pub path: &'static str,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Knobs for the mock's answers
#[derive(Debug, Clone)]
pub struct Behaviour {
    pub total_results: u64,
    /// Bibliography answers with the auth-expired code
    pub expire_bibliography: bool,
    /// Bibliography answers `status=false` with an ordinary error code
    pub reject_bibliography: bool,
    /// Search answers HTTP 500 with a plain-text body
    pub search_http_error: bool,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            total_results: 23,
            expire_bibliography: false,
            reject_bibliography: false,
            search_http_error: false,
        }
    }
}

#[derive(Default)]
pub struct Remote {
    pub calls: Mutex<Vec<Call>>,
    pub behaviour: Mutex<Behaviour>,
}

impl Remote {
    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn set(&self, behaviour: Behaviour) {
        *self.behaviour.lock().expect("behaviour lock") = behaviour;
    }

    fn behaviour(&self) -> Behaviour {
        self.behaviour.lock().expect("behaviour lock").clone()
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn authorized(call: &Call) -> bool {
    call.authorization.as_deref() == Some(format!("Bearer {}", TOKEN).as_str())
        && call.query.get("apikey").map(String::as_str) == Some(CLIENT_ID)
}

fn expired() -> Json<Value> {
    Json(json!({
        "status": false,
        "data": null,
        "error_msg": "invalid token or apikey",
        "error_code": EXPIRED_CODE
    }))
}

async fn token(State(remote): State<Arc<Remote>>, Json(body): Json<Value>) -> Json<Value> {
    remote.record(Call {
        path: "/token",
        query: HashMap::new(),
        authorization: None,
        body: body.clone(),
    });

    if body["client_id"] == CLIENT_ID && body["client_secret"] == CLIENT_SECRET {
        Json(json!({"status": true, "data": {"token": TOKEN}, "error_msg": null, "error_code": null}))
    } else {
        Json(json!({"status": false, "data": {}, "error_msg": "invalid client", "error_code": 401}))
    }
}

async fn patents(
    State(remote): State<Arc<Remote>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    let call = Call {
        path: "/api/v1/search/patents",
        query,
        authorization: authorization(&headers),
        body,
    };
    remote.record(call.clone());
    let behaviour = remote.behaviour();

    if behaviour.search_http_error {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    if !authorized(&call) {
        return expired().into_response();
    }

    let limit = call.body["limit"].as_u64().unwrap_or(10);
    let offset = call.body["offset"].as_u64().unwrap_or(0);
    let end = (offset + limit).min(behaviour.total_results);
    let results: Vec<Value> = (offset..end)
        .map(|i| json!({"patent_id": format!("p{}", i), "pn": format!("CN{}A", i)}))
        .collect();

    Json(json!({
        "status": true,
        "data": {"total_search_result_count": behaviour.total_results, "results": results},
        "error_msg": null,
        "error_code": null
    }))
    .into_response()
}

async fn bibliography(
    State(remote): State<Arc<Remote>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let call = Call {
        path: "/api/v1/search/bibliography",
        query,
        authorization: authorization(&headers),
        body,
    };
    remote.record(call.clone());

    let behaviour = remote.behaviour();
    if behaviour.expire_bibliography || !authorized(&call) {
        return expired();
    }
    if behaviour.reject_bibliography {
        return Json(json!({"status": false, "data": {}, "error_msg": "quota exceeded", "error_code": 42}));
    }

    let ids = call.query.get("patent_id").cloned().unwrap_or_default();
    let records: Vec<Value> = ids
        .split(',')
        .filter(|id| !id.is_empty())
        .map(|id| {
            json!({
                "patent_id": id,
                "bibliographic_data": {
                    "invention_title": [{"text": format!("Title {}", id), "lang": "en"}],
                    "parties": {
                        "applicants": [{"name": format!("Zeta {}", id)}, {"name": format!("Alpha {}", id)}],
                        "inventors": [{"name": format!("Inventor {}", id)}]
                    },
                    "application_reference": {"date": 20200101},
                    "publication_reference": {"date": "20210101"}
                }
            })
        })
        .collect();

    Json(json!({"status": true, "data": records, "error_msg": null, "error_code": null}))
}

/// Serve the mock on an ephemeral port, returning its base URL
pub async fn spawn_remote(remote: Arc<Remote>) -> String {
    let app = Router::new()
        .route("/token", post(token))
        .route("/api/v1/search/patents", post(patents))
        .route("/api/v1/search/bibliography", post(bibliography))
        .with_state(remote);

    spawn(app).await
}

pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    format!("http://{}", addr)
}

/// Mock remote plus a client pointed at it
pub async fn setup() -> (Arc<Remote>, ApiClient) {
    let remote = Arc::new(Remote::default());
    let base = spawn_remote(remote.clone()).await;
    let client = ApiClient::new(ClientConfig::new(&base).expect("config")).expect("client");
    (remote, client)
}

/// A base URL nothing listens on
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}
