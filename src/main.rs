//! Application entry point for the `meteo-dashboard` service.
//!
//! This binary orchestrates the full startup sequence for the weather
//! dashboard, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the upstream client for the weather backend API
//! - Starting one independent poll loop per station dataset
//! - Mounting the dashboard routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `METEO_API_URL` (**required**) – weather backend base URL
//! - `LISTEN_PORT` (optional) – dashboard port (default: 8080)
//! - `METEO_LOG_LEVEL` (optional) – log level or filter directive (default: `debug`)
//! - `METEO_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP) by
//! delegating configuration parsing to `config`, normalization to `pipeline`,
//! polling to `poller` and route registration to `routes`.
use std::{env, net::SocketAddr};

use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

mod config;
mod error;
mod models;
mod pipeline;
mod poller;
mod routes;
mod state;
mod upstream;

pub use config::Config;

// Re-exported for routes/*.rs so they only depend on their parent module.
pub use models::Station;
pub use state::{DashboardState, SharedState, StationView};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let client = upstream::ApiClient::new(&cfg.api_url, cfg.http_timeout)
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

    let state = DashboardState::shared();
    let loops = poller::spawn_dashboard(&cfg, &client, &state);
    tracing::info!("Started {} poll loops", loops.len());

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.listen_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    for handle in loops {
        tracing::debug!("stopping {}", handle.name());
        handle.cancel();
    }

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// Target, file and line are always printed. The rest is environment driven:
/// - `RUST_LOG` wins when set; otherwise `METEO_LOG_LEVEL` is read as a full
///   filter directive (`info`, `meteo_dashboard::poller=trace`, ...) with
///   `debug` as default. Upstream HTTP crates are held at `warn` either way
///   unless the directive names them.
/// - `METEO_SPAN_EVENTS`: `full`, `enter_exit`, or close events only.
/// - `FORCE_COLOR`: `1|true|yes` / `0|false|no`, TTY detection otherwise.
///
/// Call once, before any poll loop starts.
fn init_tracing() {
    // ---
    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events())
        .with_env_filter(env_filter())
        .with_ansi(use_color())
        .compact()
        .init();
}

fn span_events() -> FmtSpan {
    match env::var("METEO_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    }
}

fn use_color() -> bool {
    match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    }
}

const QUIET_UPSTREAM: [&str; 2] = ["hyper=warn", "reqwest=warn"];

fn env_filter() -> EnvFilter {
    // ---
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let directive = env::var("METEO_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
    let mut full = directive.trim().to_string();
    for quiet in QUIET_UPSTREAM {
        let crate_name = quiet.split('=').next().unwrap_or(quiet);
        if !full.contains(crate_name) {
            full.push(',');
            full.push_str(quiet);
        }
    }

    EnvFilter::try_new(&full).unwrap_or_else(|e| {
        eprintln!("invalid METEO_LOG_LEVEL '{directive}' ({e}), using debug");
        EnvFilter::new(format!("debug,{}", QUIET_UPSTREAM.join(",")))
    })
}
