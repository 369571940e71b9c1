//! rustpatsearch - patent search client
//!
//! Logs in against the patent search API, keeps the session on disk and
//! pages through search results.
//!
//! ## Usage
//!
//! ### One-shot search
//! ```bash
//! rustpatsearch login --client-id ID --client-secret SECRET
//! rustpatsearch search "solid-state battery" --page 2 --page-size 20
//! ```
//!
//! ### Interactive browsing
//! ```bash
//! rustpatsearch browse "solid-state battery"
//! ```
//!
//! ### HTTP bridge
//! ```bash
//! rustpatsearch serve --port 3000
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rustpatsearch::{
    auth::{self, Credentials, LoginOutcome, Route},
    client::ApiClient,
    config::{ClientConfig, DEFAULT_API_URL},
    pagination::PageSize,
    render,
    search::{FetchRequest, SearchQuery, SearchView},
    server::{self, AppState},
    store::{FileStore, Session, SessionStore},
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Patent search client
#[derive(Parser)]
#[command(name = "rustpatsearch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// API base URL
    #[arg(long, global = true, env = "PATSEARCH_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds (unbounded when omitted)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Session file (default: ~/.patsearch_session.json)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange client credentials for a token and store the session
    Login {
        /// Client ID (prompted when omitted)
        #[arg(long, env = "PATSEARCH_CLIENT_ID")]
        client_id: Option<String>,

        /// Client secret (prompted when omitted)
        #[arg(long, env = "PATSEARCH_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show whether a session is stored
    Status,

    /// Fetch and print one page of results
    Search {
        /// Search text
        query: String,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u64,

        /// Results per page: 10, 15 or 20
        #[arg(long, default_value = "10")]
        page_size: PageSize,

        /// Also write the page to a timestamped CSV in this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Page through results interactively
    Browse {
        /// Initial search text
        #[arg(default_value = "")]
        query: String,

        /// Results per page: 10, 15 or 20
        #[arg(long, default_value = "10")]
        page_size: PageSize,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(io::stderr)
            .init();
    }

    let mut config = ClientConfig::new(&cli.api_url).context("Invalid --api-url")?;
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let client = ApiClient::new(config)?;

    let store = match cli.session_file {
        Some(path) => FileStore::with_path(path),
        None => FileStore::default(),
    };
    debug!(path = ?store.path(), "Using session file");

    match cli.command {
        Commands::Login {
            client_id,
            client_secret,
        } => run_login(&client, &store, client_id, client_secret).await,
        Commands::Logout => {
            auth::logout(&store)?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Status => {
            show_status(&store);
            Ok(())
        }
        Commands::Search {
            query,
            page,
            page_size,
            output,
        } => run_search(&client, &store, SearchQuery::new(query, page, page_size), output).await,
        Commands::Browse { query, page_size } => {
            run_browse(&client, &store, SearchQuery::new(query, 1, page_size)).await
        }
        Commands::Serve { port, host } => {
            println!("Starting server at http://{}:{}", host, port);
            let state = AppState {
                client,
                store: Arc::new(store),
            };
            server::run_server(&host, port, state)
                .await
                .context("Server error")
        }
    }
}

// ============================================================================
// Login
// ============================================================================

async fn run_login(
    client: &ApiClient,
    store: &FileStore,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<()> {
    if auth::initial_route(store) == Route::Search {
        println!("Already logged in. Run `logout` first to switch accounts.");
        return Ok(());
    }

    let client_id = match client_id {
        Some(id) => id,
        None => prompt("Client ID: ")?,
    };
    let client_secret = match client_secret {
        Some(secret) => secret,
        None => prompt("Client Secret: ")?,
    };

    let outcome = auth::login(client, store, &Credentials::new(client_id, client_secret)).await;

    if let LoginOutcome::Invalid(errors) = &outcome {
        for message in errors.messages() {
            eprintln!("{}", message);
        }
        anyhow::bail!("Missing credentials");
    }

    if let Some(notification) = outcome.notification() {
        println!("{}", notification);
    }

    match outcome.route() {
        Route::Search => Ok(()),
        Route::Login => anyhow::bail!("Login failed"),
    }
}

fn show_status(store: &FileStore) {
    match Session::load(store) {
        Some(session) => println!("Logged in as {} ({:?})", session.apikey, store.path()),
        None => println!("Not logged in."),
    }
}

/// Read one line from stdin, `None` at end of input
fn read_input(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
}

fn prompt(label: &str) -> Result<String> {
    Ok(read_input(label)?.unwrap_or_default())
}

// ============================================================================
// Search
// ============================================================================

async fn run_search(
    client: &ApiClient,
    store: &FileStore,
    query: SearchQuery,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut view = SearchView::with_query(query);

    let Some(request) = view.mount(store) else {
        anyhow::bail!("Not logged in. Run `login` first.");
    };
    view.execute(client, store, request).await;

    print_view(&mut view);

    if view.route() == Route::Login {
        anyhow::bail!("Session expired. Run `login` again.");
    }

    if let Some(dir) = output {
        let path = csv_path(&dir, view.term(), view.current_page())?;
        render::save_csv(&path, render::ROW_COLUMNS, &view.rows())?;
        println!("Saved: {:?}", path);
    }

    Ok(())
}

/// `<dir>/<timestamp>_<query>_p<page>.csv`
fn csv_path(dir: &Path, term: &str, page: u64) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).context("Failed to create output directory")?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let safe_term: String = term
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect::<String>()
        .trim()
        .replace(' ', "_");

    Ok(dir.join(format!("{}_{}_p{}.csv", timestamp, safe_term, page)))
}

fn print_view(view: &mut SearchView) {
    if let Some(notification) = view.take_notification() {
        println!("{}", notification);
    }

    println!("\n{}", render::render_heading(view.total_results()));
    print!("{}", render::render_table(&view.rows()));

    let controls = render::render_controls(&view.controls());
    if !controls.is_empty() {
        println!("\n{}   ({} / page)", controls, view.page_size());
    }
}

// ============================================================================
// Interactive browsing
// ============================================================================

const BROWSE_HELP: &str = "Commands: <text> search | <number> go to page | n next | p previous | size 10|15|20 | q quit";

/// One line of interactive input
#[derive(Debug, PartialEq, Eq)]
enum BrowseCommand {
    Quit,
    Next,
    Previous,
    Page(u64),
    Size(PageSize),
    Search(String),
    /// Enter on an empty line re-runs the current search
    Resubmit,
    Help,
    Invalid(String),
}

fn parse_browse_command(line: &str) -> BrowseCommand {
    let line = line.trim();
    match line {
        "" => return BrowseCommand::Resubmit,
        "q" | "quit" | "exit" => return BrowseCommand::Quit,
        "n" | "next" => return BrowseCommand::Next,
        "p" | "prev" | "previous" => return BrowseCommand::Previous,
        "?" | "help" => return BrowseCommand::Help,
        _ => {}
    }

    if let Ok(page) = line.parse::<u64>() {
        return BrowseCommand::Page(page);
    }

    if let Some(size) = line.strip_prefix("size ") {
        return match size.parse::<PageSize>() {
            Ok(size) => BrowseCommand::Size(size),
            Err(e) => BrowseCommand::Invalid(e),
        };
    }

    let text = line.strip_prefix("search ").unwrap_or(line);
    BrowseCommand::Search(text.trim().to_string())
}

async fn run_browse(client: &ApiClient, store: &FileStore, query: SearchQuery) -> Result<()> {
    let mut view = SearchView::with_query(query);

    let Some(request) = view.mount(store) else {
        anyhow::bail!("Not logged in. Run `login` first.");
    };
    fetch_and_print(client, store, &mut view, request).await;
    println!("{}", BROWSE_HELP);

    loop {
        if view.route() == Route::Login {
            anyhow::bail!("Session expired. Run `login` again.");
        }

        let Some(line) = read_input("> ")? else {
            break;
        };
        let request = match parse_browse_command(&line) {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                println!("{}", BROWSE_HELP);
                None
            }
            BrowseCommand::Invalid(message) => {
                println!("{}", message);
                None
            }
            BrowseCommand::Next => view.next_page(),
            BrowseCommand::Previous => view.previous_page(),
            BrowseCommand::Page(page) => view.go_to(page),
            BrowseCommand::Size(size) => view.set_page_size(size),
            BrowseCommand::Search(text) => view.submit(text),
            BrowseCommand::Resubmit => {
                let term = view.term().to_string();
                view.submit(term)
            }
        };

        if let Some(request) = request {
            fetch_and_print(client, store, &mut view, request).await;
        }
    }

    Ok(())
}

async fn fetch_and_print(
    client: &ApiClient,
    store: &dyn SessionStore,
    view: &mut SearchView,
    request: FetchRequest,
) {
    println!("Loading page {}...", request.query.page);
    view.execute(client, store, request).await;
    print_view(view);
}
