//! API route definitions
//!
//! - /health - liveness and summary
//! - /api/v1/state, /geometry, /nodes, /spectrum, /hardware - snapshots
//! - /api/v1/valves, /compressor, /leak - controls
//! - /api/v1/simulation/start, /simulation/stop - run state
//! - /api/v1/live - WebSocket feed

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Create all `/api/v1` routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/geometry", get(handlers::get_geometry))
        .route("/nodes", get(handlers::get_nodes))
        .route("/spectrum", get(handlers::get_spectrum))
        .route("/hardware", get(handlers::get_hardware))
        .route("/valves", post(handlers::set_valves))
        .route("/compressor", post(handlers::set_compressor))
        .route("/leak", post(handlers::set_leak))
        .route("/simulation/start", post(handlers::start_simulation))
        .route("/simulation/stop", post(handlers::stop_simulation))
        .route("/live", get(handlers::live_feed))
        .with_state(state)
}

/// Health endpoint at root level
pub fn health_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state)
}
