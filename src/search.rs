//! Search-then-enrich orchestration and the search view state.
//!
//! A page of results takes two calls:
//!
//! 1. `search_patents` with the query text, page size and offset. Only the
//!    total hit count and the hit ids are used from this answer.
//! 2. `search_bibliography` for the comma-joined ids. Its records are what
//!    gets rendered.
//!
//! [`SearchView`] holds the page state and decides when a fetch is due.
//! Each fetch it starts carries a generation number; answers from an older
//! generation are dropped so a slow response cannot overwrite a newer page.

use crate::auth::Route;
use crate::client::{ApiClient, Envelope};
use crate::error::PatsearchError;
use crate::notify::Notification;
use crate::pagination::{self, PageControls, PageSize};
use crate::patent::BibliographicRecord;
use crate::render::ResultRow;
use crate::store::{Session, SessionStore};
use tracing::{debug, info, warn};

const SEARCH_FAILED: &str = "Search failed";

/// One page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    /// 1-based
    pub page: u64,
    pub page_size: PageSize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, page: u64, page_size: PageSize) -> Self {
        Self {
            text: text.into(),
            page: page.max(1),
            page_size,
        }
    }

    pub fn offset(&self) -> u64 {
        pagination::offset(self.page, self.page_size)
    }
}

/// A successfully loaded page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Hit count reported by the search call
    pub total_results: u64,
    /// Records from the bibliography call, in the order it returned them
    pub records: Vec<BibliographicRecord>,
}

/// Result of [`fetch_page`]
///
/// On the failure variants `total_results` is the search call's hit count
/// when only the bibliography call failed, `None` when the search call did.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded(SearchPage),
    /// The API answered `status=false`
    Rejected {
        code: i64,
        message: String,
        total_results: Option<u64>,
    },
    /// Token or apikey rejected; the session must be dropped
    AuthExpired {
        message: String,
        total_results: Option<u64>,
    },
    /// The request never produced an envelope
    Transport {
        message: String,
        total_results: Option<u64>,
    },
}

impl FetchOutcome {
    /// Sort a failed call into the outcome the view reacts to
    fn from_error(error: PatsearchError, step: &str, total_results: Option<u64>) -> Self {
        warn!(step = step, error = %error, "Page fetch failed");
        match error {
            PatsearchError::AuthExpired { message } => FetchOutcome::AuthExpired {
                message,
                total_results,
            },
            PatsearchError::Api { code, message } => FetchOutcome::Rejected {
                code,
                message,
                total_results,
            },
            other => FetchOutcome::Transport {
                message: other.to_string(),
                total_results,
            },
        }
    }
}

/// Run both calls for one page
pub async fn fetch_page(client: &ApiClient, session: &Session, query: &SearchQuery) -> FetchOutcome {
    let hits = match client
        .search_patents(session, &query.text, query.page_size.get(), query.offset())
        .await
        .and_then(Envelope::into_data)
    {
        Ok(hits) => hits,
        Err(e) => return FetchOutcome::from_error(e, "search", None),
    };

    let total_results = hits.total_search_result_count;
    let ids = hits.joined_ids();
    debug!(total = total_results, hits = hits.results.len(), "Search returned");

    if ids.is_empty() {
        return FetchOutcome::Loaded(SearchPage {
            total_results,
            records: Vec::new(),
        });
    }

    let records = match client
        .search_bibliography(session, &ids)
        .await
        .and_then(Envelope::into_data)
    {
        Ok(records) => records,
        Err(e) => return FetchOutcome::from_error(e, "bibliography", Some(total_results)),
    };
    info!(total = total_results, records = records.len(), "Loaded page");

    FetchOutcome::Loaded(SearchPage {
        total_results,
        records,
    })
}

/// A fetch the view has asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub query: SearchQuery,
}

/// State of the search screen
#[derive(Debug, Clone)]
pub struct SearchView {
    term: String,
    current_page: u64,
    page_size: PageSize,
    total_pages: u64,
    total_results: u64,
    results: Vec<BibliographicRecord>,
    loading: bool,
    route: Route,
    notification: Option<Notification>,
    generation: u64,
}

impl Default for SearchView {
    fn default() -> Self {
        Self {
            term: String::new(),
            current_page: 1,
            page_size: PageSize::default(),
            total_pages: 0,
            total_results: 0,
            results: Vec::new(),
            loading: false,
            route: Route::Search,
            notification: None,
            generation: 0,
        }
    }
}

impl SearchView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at a given page and size (used by one-shot searches)
    pub fn with_query(query: SearchQuery) -> Self {
        Self {
            term: query.text,
            current_page: query.page,
            page_size: query.page_size,
            ..Self::default()
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    pub fn records(&self) -> &[BibliographicRecord] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Hand the pending notification to the caller, clearing it
    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    /// Rendered rows with their global 1-based positions
    pub fn rows(&self) -> Vec<ResultRow> {
        let first = pagination::offset(self.current_page, self.page_size);
        self.results
            .iter()
            .enumerate()
            .map(|(i, record)| ResultRow::from_record(record, first.saturating_add(i as u64 + 1)))
            .collect()
    }

    pub fn controls(&self) -> PageControls {
        PageControls::new(self.current_page, self.total_pages, self.total_results)
    }

    /// Entering the view: without a session go to login, otherwise load the current page
    pub fn mount(&mut self, store: &dyn SessionStore) -> Option<FetchRequest> {
        if Session::load(store).is_none() {
            info!("No session, redirecting to login");
            self.route = Route::Login;
            return None;
        }
        Some(self.begin_fetch())
    }

    /// New query text (Enter or the Search button); always back to page 1
    pub fn submit(&mut self, term: impl Into<String>) -> Option<FetchRequest> {
        self.term = term.into();
        self.current_page = 1;
        Some(self.begin_fetch())
    }

    /// Change page size; back to page 1
    pub fn set_page_size(&mut self, size: PageSize) -> Option<FetchRequest> {
        if size == self.page_size && self.current_page == 1 {
            return None;
        }
        self.page_size = size;
        self.current_page = 1;
        Some(self.begin_fetch())
    }

    /// Jump to a page; out-of-range or unchanged pages do nothing
    pub fn go_to(&mut self, page: u64) -> Option<FetchRequest> {
        if page < 1 || page > self.total_pages.max(1) || page == self.current_page {
            return None;
        }
        self.current_page = page;
        Some(self.begin_fetch())
    }

    pub fn next_page(&mut self) -> Option<FetchRequest> {
        if self.current_page >= self.total_pages {
            return None;
        }
        self.go_to(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> Option<FetchRequest> {
        if self.current_page <= 1 {
            return None;
        }
        self.go_to(self.current_page - 1)
    }

    /// Mark a fetch as in flight for the current state
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.generation += 1;
        self.loading = true;
        FetchRequest {
            generation: self.generation,
            query: SearchQuery::new(self.term.clone(), self.current_page, self.page_size),
        }
    }

    /// Apply a fetch result. Returns `false` when the result was stale and ignored.
    pub fn apply(&mut self, generation: u64, outcome: FetchOutcome, store: &dyn SessionStore) -> bool {
        if generation != self.generation {
            debug!(generation = generation, latest = self.generation, "Dropping stale response");
            return false;
        }
        self.loading = false;

        match outcome {
            FetchOutcome::Loaded(page) => {
                self.set_totals(Some(page.total_results));
                self.results = page.records;
            }
            FetchOutcome::Rejected {
                message,
                total_results,
                ..
            }
            | FetchOutcome::Transport {
                message,
                total_results,
            } => {
                self.set_totals(total_results);
                self.notify(Notification::error(SEARCH_FAILED, message));
            }
            FetchOutcome::AuthExpired {
                message,
                total_results,
            } => {
                self.set_totals(total_results);
                self.notify(Notification::error(SEARCH_FAILED, message));
                if let Err(e) = Session::clear(store) {
                    warn!(error = %e, "Failed to clear session");
                }
                self.route = Route::Login;
            }
        }
        true
    }

    /// Step 1 totals stand even when enrichment fails
    fn set_totals(&mut self, total_results: Option<u64>) {
        if let Some(total) = total_results {
            self.total_results = total;
            self.total_pages = pagination::total_pages(total, self.page_size);
        }
    }

    fn notify(&mut self, notification: Notification) {
        notification.emit();
        self.notification = Some(notification);
    }

    /// Run a requested fetch against the API and apply its result
    pub async fn execute(
        &mut self,
        client: &ApiClient,
        store: &dyn SessionStore,
        request: FetchRequest,
    ) -> bool {
        let session = match Session::require(store) {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "Cannot fetch");
                self.loading = false;
                self.route = Route::Login;
                return false;
            }
        };
        let outcome = fetch_page(client, &session, &request.query).await;
        self.apply(request.generation, outcome, store)
    }
}
