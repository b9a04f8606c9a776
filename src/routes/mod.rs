use axum::Router;

use crate::SharedState;

mod health;
mod stations;

// ---

pub fn router(state: SharedState) -> Router {
    // ---
    Router::new()
        .merge(stations::router())
        .merge(health::router())
        .with_state(state)
}
