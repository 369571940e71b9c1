//! # rustpatsearch
//!
//! Patent search client: login, persisted session and paginated
//! search-then-enrich results against a remote REST API.
//!
//! ## Modules
//!
//! - [`client`] - HTTP client for the token, search and bibliography endpoints
//! - [`auth`] - Credential validation and the login flow
//! - [`search`] - Two-step page fetch and the search view state
//! - [`pagination`] - Page arithmetic and the page-number window
//! - [`render`] - Result rows, text table and CSV export
//! - [`store`] - Session persistence
//! - [`server`] - Local HTTP bridge
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustpatsearch::{auth, config::ClientConfig, client::ApiClient, search::SearchView, store::FileStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:8080")?)?;
//!     let store = FileStore::new()?;
//!     auth::login(&client, &store, &auth::Credentials::new("id", "secret")).await;
//!
//!     let mut view = SearchView::new();
//!     if let Some(request) = view.submit("solid-state battery") {
//!         view.execute(&client, &store, request).await;
//!     }
//!     println!("Found {} results", view.total_results());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod pagination;
pub mod patent;
pub mod render;
pub mod search;
pub mod server;
pub mod store;

pub use error::{PatsearchError, Result};
