//! Dashboard health endpoint.
//!
//! Follows the Explicit Module Boundary Pattern (EMBP): the handler stays
//! private, the gateway (`mod.rs`) only sees the subrouter.

use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{SharedState, Station};

/// Poll-loop summary of one station.
#[derive(Serialize)]
struct StationHealth {
    /// Jobs whose last cycle failed.
    failing: Vec<String>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct HealthResponse {
    /// `"ok"`, or `"degraded"` while any poll loop carries an error flag.
    status: &'static str,
    stations: BTreeMap<Station, StationHealth>,
}

/// Handle `GET /health`.
///
/// Always answers 200: a failing backend degrades the dashboard, it does not
/// take the service down.
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    // ---
    let guard = state.read().await;
    let mut degraded = false;
    let stations = guard
        .stations()
        .map(|(station, view)| {
            degraded |= view.has_errors();
            let health = StationHealth {
                failing: view.errors.keys().cloned().collect(),
                updated_at: view.updated_at,
            };
            (station, health)
        })
        .collect();

    Json(HealthResponse {
        status: if degraded { "degraded" } else { "ok" },
        stations,
    })
}

pub fn router() -> Router<SharedState> {
    Router::new().route("/health", get(health))
}
