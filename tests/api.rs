//! Login and search flows against a mock of the remote API.

mod common;

use common::{Behaviour, CLIENT_ID, CLIENT_SECRET, TOKEN};
use rustpatsearch::auth::{self, Credentials, LoginOutcome, Route};
use rustpatsearch::client::ApiClient;
use rustpatsearch::config::ClientConfig;
use rustpatsearch::notify::Level;
use rustpatsearch::pagination::{PageEntry, PageSize};
use rustpatsearch::search::{fetch_page, FetchOutcome, SearchQuery, SearchView};
use rustpatsearch::store::{FileStore, MemoryStore, Session, SessionStore, APIKEY_KEY, TOKEN_KEY};

const PATENTS: &str = "/api/v1/search/patents";
const BIBLIOGRAPHY: &str = "/api/v1/search/bibliography";

fn logged_in() -> MemoryStore {
    let store = MemoryStore::new();
    Session::new(TOKEN, CLIENT_ID).save(&store).expect("save session");
    store
}

#[tokio::test]
async fn test_login_with_empty_secret_sends_nothing() {
    let (remote, client) = common::setup().await;
    let store = MemoryStore::new();

    let outcome = auth::login(&client, &store, &Credentials::new(CLIENT_ID, "")).await;

    match outcome {
        LoginOutcome::Invalid(errors) => {
            assert!(errors.client_secret);
            assert!(!errors.client_id);
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert!(remote.calls().is_empty());
    assert!(store.get(TOKEN_KEY).is_none());
}

#[tokio::test]
async fn test_login_success_stores_session() {
    let (remote, client) = common::setup().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::with_path(dir.path().join("session.json"));

    let outcome = auth::login(&client, &store, &Credentials::new(CLIENT_ID, CLIENT_SECRET)).await;

    assert_eq!(outcome.route(), Route::Search);
    assert_eq!(outcome.notification().map(|n| n.level), Some(Level::Success));
    assert_eq!(store.get(TOKEN_KEY).as_deref(), Some(TOKEN));
    assert_eq!(store.get(APIKEY_KEY).as_deref(), Some(CLIENT_ID));
    assert_eq!(auth::initial_route(&store), Route::Search);

    let calls = remote.calls_to("/token");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body["client_id"], CLIENT_ID);
    assert_eq!(calls[0].body["client_secret"], CLIENT_SECRET);
}

#[tokio::test]
async fn test_login_rejected_shows_server_message() {
    let (_remote, client) = common::setup().await;
    let store = MemoryStore::new();

    let outcome = auth::login(&client, &store, &Credentials::new(CLIENT_ID, "wrong")).await;

    match &outcome {
        LoginOutcome::Rejected { notification } => {
            assert_eq!(notification.level, Level::Error);
            assert_eq!(notification.description, "invalid client");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(outcome.route(), Route::Login);
    assert!(Session::load(&store).is_none());
}

#[tokio::test]
async fn test_login_transport_failure() {
    let base = common::dead_url().await;
    let client = ApiClient::new(ClientConfig::new(&base).expect("config")).expect("client");
    let store = MemoryStore::new();

    let outcome = auth::login(&client, &store, &Credentials::new(CLIENT_ID, CLIENT_SECRET)).await;

    assert!(matches!(outcome, LoginOutcome::Failed { .. }));
    assert_eq!(outcome.route(), Route::Login);
    assert!(Session::load(&store).is_none());
}

#[tokio::test]
async fn test_search_then_enrich() {
    let (remote, client) = common::setup().await;
    let store = logged_in();

    let mut view = SearchView::new();
    let request = view.submit("battery").expect("fetch requested");
    assert!(view.execute(&client, &store, request).await);

    assert_eq!(view.total_results(), 23);
    assert_eq!(view.total_pages(), 3);
    assert_eq!(view.records().len(), 10);
    assert!(view.notification().is_none());

    let search = &remote.calls_to(PATENTS)[0];
    assert_eq!(search.authorization.as_deref(), Some("Bearer tok-123"));
    assert_eq!(search.query.get("apikey").map(String::as_str), Some(CLIENT_ID));
    assert_eq!(search.body["query_text"], "battery");
    assert_eq!(search.body["limit"], 10);
    assert_eq!(search.body["offset"], 0);

    let bibliography = &remote.calls_to(BIBLIOGRAPHY)[0];
    assert_eq!(
        bibliography.query.get("patent_id").map(String::as_str),
        Some("p0,p1,p2,p3,p4,p5,p6,p7,p8,p9")
    );
    assert_eq!(bibliography.authorization.as_deref(), Some("Bearer tok-123"));

    // second page: window for C=2, T=3 is [1, 2, 3]
    let request = view.next_page().expect("fetch requested");
    assert!(view.execute(&client, &store, request).await);
    assert_eq!(
        view.controls().buttons.iter().map(|b| b.entry).collect::<Vec<_>>(),
        vec![PageEntry::Page(1), PageEntry::Page(2), PageEntry::Page(3)]
    );
    assert_eq!(remote.calls_to(PATENTS)[1].body["offset"], 10);

    let rows = view.rows();
    assert_eq!(rows[0].position, 11);
    assert_eq!(rows[0].patent_id, "p10");
    assert_eq!(rows[0].applicants, "Zeta p10,Alpha p10");
    assert_eq!(rows[0].application_date, "20200101");

    // last page is short
    let request = view.go_to(3).expect("fetch requested");
    view.execute(&client, &store, request).await;
    assert_eq!(view.records().len(), 3);
    assert!(view.next_page().is_none());
}

#[tokio::test]
async fn test_page_size_change_resets_offset() {
    let (remote, client) = common::setup().await;
    let store = logged_in();

    let mut view = SearchView::with_query(SearchQuery::new("battery", 3, PageSize::Ten));
    let request = view.mount(&store).expect("fetch requested");
    view.execute(&client, &store, request).await;

    let request = view.set_page_size(PageSize::Fifteen).expect("fetch requested");
    view.execute(&client, &store, request).await;

    let last = remote.calls_to(PATENTS).pop().expect("search call");
    assert_eq!(last.body["limit"], 15);
    assert_eq!(last.body["offset"], 0);
    assert_eq!(view.total_pages(), 2);
}

#[tokio::test]
async fn test_bibliography_auth_expiry_forces_logout() {
    let (remote, client) = common::setup().await;
    remote.set(Behaviour {
        expire_bibliography: true,
        ..Default::default()
    });
    let store = logged_in();

    let mut view = SearchView::new();
    let request = view.mount(&store).expect("fetch requested");
    view.execute(&client, &store, request).await;

    // the search call itself succeeded
    assert_eq!(remote.calls_to(PATENTS).len(), 1);
    assert_eq!(view.route(), Route::Login);
    assert!(store.get(TOKEN_KEY).is_none());
    assert!(store.get(APIKEY_KEY).is_none());
    let notification = view.notification().expect("notification");
    assert_eq!(notification.description, "invalid token or apikey");
}

#[tokio::test]
async fn test_bibliography_rejection_keeps_search_totals() {
    let (remote, client) = common::setup().await;
    remote.set(Behaviour {
        reject_bibliography: true,
        ..Default::default()
    });
    let store = logged_in();

    let mut view = SearchView::new();
    let request = view.submit("battery").expect("fetch requested");
    view.execute(&client, &store, request).await;

    assert_eq!(remote.calls_to(BIBLIOGRAPHY).len(), 1);
    assert_eq!(view.total_results(), 23);
    assert_eq!(view.total_pages(), 3);
    assert!(view.records().is_empty());
    assert_eq!(view.route(), Route::Search);
    let notification = view.take_notification().expect("notification");
    assert_eq!(notification.level, Level::Error);
    assert_eq!(notification.description, "quota exceeded");
    assert!(Session::load(&store).is_some());
}

#[tokio::test]
async fn test_search_auth_expiry_skips_bibliography() {
    let (remote, client) = common::setup().await;
    let store = MemoryStore::new();
    Session::new("stale-token", CLIENT_ID).save(&store).expect("save session");

    let outcome = fetch_page(
        &client,
        &Session::load(&store).expect("session"),
        &SearchQuery::new("x", 1, PageSize::Ten),
    )
    .await;

    assert!(matches!(outcome, FetchOutcome::AuthExpired { .. }));
    assert!(remote.calls_to(BIBLIOGRAPHY).is_empty());
}

#[tokio::test]
async fn test_empty_results_skip_enrichment() {
    let (remote, client) = common::setup().await;
    remote.set(Behaviour {
        total_results: 0,
        ..Default::default()
    });
    let store = logged_in();

    let mut view = SearchView::new();
    let request = view.submit("nothing matches").expect("fetch requested");
    view.execute(&client, &store, request).await;

    assert_eq!(view.total_results(), 0);
    assert_eq!(view.total_pages(), 0);
    assert!(view.records().is_empty());
    assert!(!view.controls().show_prev_next);
    assert!(remote.calls_to(BIBLIOGRAPHY).is_empty());
}

#[tokio::test]
async fn test_http_error_is_reported_not_fatal() {
    let (remote, client) = common::setup().await;
    remote.set(Behaviour {
        search_http_error: true,
        ..Default::default()
    });
    let store = logged_in();

    let mut view = SearchView::new();
    let request = view.submit("battery").expect("fetch requested");
    view.execute(&client, &store, request).await;

    assert_eq!(view.route(), Route::Search);
    assert!(!view.is_loading());
    let notification = view.take_notification().expect("notification");
    assert_eq!(notification.level, Level::Error);
    assert!(notification.description.contains("500"));
    assert!(Session::load(&store).is_some());
}

#[tokio::test]
async fn test_transport_error_is_reported() {
    let base = common::dead_url().await;
    let client = ApiClient::new(ClientConfig::new(&base).expect("config")).expect("client");
    let store = logged_in();

    let mut view = SearchView::new();
    let request = view.submit("battery").expect("fetch requested");
    view.execute(&client, &store, request).await;

    assert_eq!(view.route(), Route::Search);
    assert!(view.notification().is_some());
}
