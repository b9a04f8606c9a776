//! Configuration loader for the `meteo-dashboard` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). Poll intervals, the upstream API location and the
//! listen port all live here so the rest of the crate never calls `env::var`.
//!
use std::{env, time::Duration};

use anyhow::{anyhow, bail, Result};

use crate::upstream::TimeRange;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional poll interval (seconds) that must be non-zero.
macro_rules! parse_env_secs {
    ($var_name:expr, $default:expr) => {{
        let secs = parse_env_u32!($var_name, $default);
        if secs == 0 {
            bail!("{} must be greater than zero", $var_name);
        }
        Duration::from_secs(u64::from(secs))
    }};
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Poll cadence for each family of dashboard datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    // ---
    /// Live summary readings.
    pub live: Duration,

    /// Trend indicators (15 min / 1 h / 24 h deltas).
    pub trend: Duration,

    /// Time-series charts.
    pub series: Duration,

    /// Slow datasets such as the Burgos daily extremes.
    pub extremes: Duration,
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Weather backend API base URL.
    pub api_url: String,

    /// Port the dashboard HTTP surface binds to.
    pub listen_port: u16,

    /// Timer period of every poll loop.
    pub intervals: PollIntervals,

    /// `limit` passed to `/api/weather/history`.
    pub history_limit: u32,

    /// `timeRange` passed to `/api/meteo-data`.
    pub series_range: TimeRange,

    /// Per-request timeout for the upstream client.
    pub http_timeout: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `METEO_API_URL` – weather backend API base URL
///
/// Optional:
/// - `LISTEN_PORT` – dashboard port (default: 8080)
/// - `LIVE_POLL_SECS` / `TREND_POLL_SECS` / `SERIES_POLL_SECS` /
///   `EXTREMES_POLL_SECS` – poll intervals (default: 30 / 60 / 300 / 900)
/// - `HISTORY_LIMIT` – history page size (default: 300)
/// - `SERIES_TIME_RANGE` – `24h`, `48h` or `7d` (default: `24h`)
/// - `HTTP_TIMEOUT_SECS` – upstream request timeout (default: 10)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let api_url = require_env!("METEO_API_URL");
    let api_url = api_url.trim_end_matches('/').to_string();

    let listen_port = parse_env_u32!("LISTEN_PORT", 8080);
    let listen_port =
        u16::try_from(listen_port).map_err(|_| anyhow!("Invalid LISTEN_PORT: {}", listen_port))?;

    let intervals = PollIntervals {
        live: parse_env_secs!("LIVE_POLL_SECS", 30),
        trend: parse_env_secs!("TREND_POLL_SECS", 60),
        series: parse_env_secs!("SERIES_POLL_SECS", 300),
        extremes: parse_env_secs!("EXTREMES_POLL_SECS", 900),
    };

    let history_limit = parse_env_u32!("HISTORY_LIMIT", 300);

    let series_range = match env::var("SERIES_TIME_RANGE") {
        Ok(raw) => raw
            .parse::<TimeRange>()
            .map_err(|e| anyhow!("Invalid SERIES_TIME_RANGE: {}", e))?,
        Err(_) => TimeRange::Day,
    };

    let http_timeout = parse_env_secs!("HTTP_TIMEOUT_SECS", 10);

    Ok(Config {
        api_url,
        listen_port,
        intervals,
        history_limit,
        series_range,
        http_timeout,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  METEO_API_URL      : {}", self.api_url);
        tracing::info!("  LISTEN_PORT        : {}", self.listen_port);
        tracing::info!("  LIVE_POLL_SECS     : {}", self.intervals.live.as_secs());
        tracing::info!("  TREND_POLL_SECS    : {}", self.intervals.trend.as_secs());
        tracing::info!("  SERIES_POLL_SECS   : {}", self.intervals.series.as_secs());
        tracing::info!("  EXTREMES_POLL_SECS : {}", self.intervals.extremes.as_secs());
        tracing::info!("  HISTORY_LIMIT      : {}", self.history_limit);
        tracing::info!("  SERIES_TIME_RANGE  : {}", self.series_range);
        tracing::info!("  HTTP_TIMEOUT_SECS  : {}", self.http_timeout.as_secs());
    }
}
