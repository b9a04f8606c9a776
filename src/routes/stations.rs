//! Read-only views of the dashboard state, one station at a time.
//!
//! These are what the chart and indicator front end polls. Nothing here talks
//! to the weather backend; the poll loops keep the state fresh.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::debug;

use crate::{SharedState, Station, StationView};

// ---

pub fn router() -> Router<SharedState> {
    // ---
    Router::new()
        .route("/stations/{station}", get(view))
        .route("/stations/{station}/live", get(live))
        .route("/stations/{station}/series", get(series))
        .route("/stations/{station}/trends", get(trends))
        .route("/stations/{station}/extremes", get(extremes))
        .route("/stations/{station}/statistics", get(statistics))
}

/// Serialize one projection of a station view, 404 if the station has none.
async fn project<T, F>(state: &SharedState, station: Station, pick: F) -> axum::response::Response
where
    T: Serialize,
    F: FnOnce(&StationView) -> T,
{
    // ---
    let guard = state.read().await;
    match guard.station(station) {
        Some(view) => (StatusCode::OK, Json(pick(view))).into_response(),
        None => (StatusCode::NOT_FOUND, Json("Unknown station")).into_response(),
    }
}

async fn view(Path(station): Path<Station>, State(state): State<SharedState>) -> impl IntoResponse {
    debug!("GET /stations/{}", station);
    project(&state, station, |v| v.clone()).await
}

async fn live(Path(station): Path<Station>, State(state): State<SharedState>) -> impl IntoResponse {
    debug!("GET /stations/{}/live", station);
    project(&state, station, |v| v.live.clone()).await
}

async fn series(Path(station): Path<Station>, State(state): State<SharedState>) -> impl IntoResponse {
    debug!("GET /stations/{}/series", station);
    project(&state, station, |v| v.series.clone()).await
}

async fn trends(Path(station): Path<Station>, State(state): State<SharedState>) -> impl IntoResponse {
    debug!("GET /stations/{}/trends", station);
    project(&state, station, |v| v.trends.clone()).await
}

#[derive(Serialize)]
struct ExtremesResponse {
    from_backend: bool,
    days: Vec<crate::pipeline::DailyExtremes>,
}

async fn extremes(
    Path(station): Path<Station>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    debug!("GET /stations/{}/extremes", station);
    project(&state, station, |v| ExtremesResponse {
        from_backend: v.backend_extremes,
        days: v.extremes.clone(),
    })
    .await
}

async fn statistics(
    Path(station): Path<Station>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    debug!("GET /stations/{}/statistics", station);
    project(&state, station, |v| v.statistics.clone()).await
}
