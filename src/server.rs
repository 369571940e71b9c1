//! Local HTTP bridge.
//!
//! Exposes login and paginated search as JSON endpoints so a browser
//! front-end can drive the same flows as the CLI:
//!
//! - `GET  /health`
//! - `POST /login`   `{client_id, client_secret}`
//! - `POST /logout`
//! - `POST /search`  `{query, page, page_size}`

use crate::auth::{self, CredentialErrors, Credentials, LoginOutcome, Route};
use crate::client::ApiClient;
use crate::notify::Notification;
use crate::pagination::{PageControls, PageSize};
use crate::render::ResultRow;
use crate::search::{SearchQuery, SearchView};
use crate::store::SessionStore;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub client: ApiClient,
    pub store: Arc<dyn SessionStore>,
}

/// Build the router; split out so tests can serve it on an ephemeral port
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/search", post(search_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until the process is stopped
pub async fn run_server(host: &str, port: u16, state: AppState) -> crate::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| crate::PatsearchError::Config(format!("Invalid host:port: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub route: Route,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<CredentialErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

async fn login_handler(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Json<LoginResponse> {
    let outcome = auth::login(&state.client, state.store.as_ref(), &credentials).await;

    Json(LoginResponse {
        route: outcome.route(),
        errors: match &outcome {
            LoginOutcome::Invalid(errors) => Some(*errors),
            _ => None,
        },
        notification: outcome.notification().cloned(),
    })
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub route: Route,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

async fn logout_handler(State(state): State<AppState>) -> Json<LogoutResponse> {
    let notification = match auth::logout(state.store.as_ref()) {
        Ok(()) => None,
        Err(e) => {
            error!(error = %e, "Logout failed");
            Some(Notification::error("Logout failed", e.to_string()))
        }
    };
    Json(LogoutResponse {
        route: Route::Login,
        notification,
    })
}

/// Search request body
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default)]
    pub page_size: PageSize,
}

fn default_page() -> u64 {
    1
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub route: Route,
    pub page: u64,
    pub page_size: PageSize,
    pub total_results: u64,
    pub total_pages: u64,
    pub rows: Vec<ResultRow>,
    pub controls: PageControls,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

impl SearchResponse {
    fn from_view(view: &mut SearchView) -> Self {
        Self {
            route: view.route(),
            page: view.current_page(),
            page_size: view.page_size(),
            total_results: view.total_results(),
            total_pages: view.total_pages(),
            rows: view.rows(),
            controls: view.controls(),
            notification: view.take_notification(),
        }
    }
}

/// Search endpoint handler
async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Json<SearchResponse> {
    info!(query = %req.query, page = req.page, page_size = %req.page_size, "Search request");

    let mut view = SearchView::with_query(SearchQuery::new(req.query, req.page, req.page_size));
    if let Some(request) = view.mount(state.store.as_ref()) {
        view.execute(&state.client, state.store.as_ref(), request).await;
    }

    Json(SearchResponse::from_view(&mut view))
}
