//! Client for the weather backend HTTP API.
//!
//! The backend is an external collaborator; every payload is read
//! defensively. Records are returned as [`RawSample`]s and never fail as a
//! batch because of one malformed entry.

use std::{fmt, str::FromStr, time::Duration};

use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{RawSample, Station};

/// `timeRange` accepted by `/api/meteo-data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Day,
    TwoDays,
    Week,
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeRange::Day => f.write_str("24h"),
            TimeRange::TwoDays => f.write_str("48h"),
            TimeRange::Week => f.write_str("7d"),
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(TimeRange::Day),
            "48h" => Ok(TimeRange::TwoDays),
            "7d" => Ok(TimeRange::Week),
            other => Err(format!("expected one of 24h, 48h, 7d, got '{other}'")),
        }
    }
}

/// Backend endpoint consumed by a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Live,
    MeteoData(TimeRange),
    History { limit: u32 },
    BurgosWeather,
    BurgosDailyExtremes,
    YearlyData,
    /// Historical statistics of a station for a year, or one month of it.
    Statistics {
        station: Station,
        year: i32,
        month: Option<u32>,
    },
}

impl Endpoint {
    pub fn path_and_query(&self) -> String {
        match self {
            Endpoint::Live => "/api/live".to_string(),
            Endpoint::MeteoData(range) => format!("/api/meteo-data?timeRange={range}"),
            Endpoint::History { limit } => format!("/api/weather/history?limit={limit}"),
            Endpoint::BurgosWeather => "/api/burgos-weather".to_string(),
            Endpoint::BurgosDailyExtremes => "/api/burgos-daily-extremes".to_string(),
            Endpoint::YearlyData => "/api/yearly-data".to_string(),
            Endpoint::Statistics {
                station,
                year,
                month,
            } => {
                let prefix = match station {
                    Station::Sarria => "/api/dashboard",
                    Station::Burgos => "/api/burgos-estadisticas",
                };
                match month {
                    Some(month) => format!("{prefix}/{year}/{month}"),
                    None => format!("{prefix}/{year}"),
                }
            }
        }
    }
}

const ENVELOPE_KEYS: [&str; 4] = ["data", "results", "readings", "records"];

/// Pull the record list out of a response body.
///
/// Top-level arrays are the list; objects wrapping an array under a known key
/// are unwrapped; any other object is one record. Non-object items are skipped.
pub fn extract_records(body: Value) -> Vec<RawSample> {
    // ---
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let wrapped = ENVELOPE_KEYS
                .iter()
                .find(|key| map.get(**key).is_some_and(Value::is_array))
                .and_then(|key| map.remove(*key));
            match wrapped {
                Some(Value::Array(items)) => items,
                _ => vec![Value::Object(map)],
            }
        }
        _ => Vec::new(),
    };

    let total = items.len();
    let records: Vec<RawSample> = items.into_iter().filter_map(RawSample::from_value).collect();
    if records.len() < total {
        debug!("skipped {} non-object records", total - records.len());
    }
    records
}

/// Thin reqwest wrapper bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path_and_query())
    }

    /// Fetch and unwrap the records of an endpoint. An empty list means the
    /// backend had nothing this cycle.
    pub async fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<RawSample>, FetchError> {
        // ---
        let url = self.url_for(endpoint);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;

        let records = extract_records(body);
        debug!("GET {} returned {} records", url, records.len());
        Ok(records)
    }
}
