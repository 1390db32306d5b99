//! Control endpoints: valves, compressor, leak, simulation start/stop

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::ApiState;
use crate::api::envelope::{ApiErrorResponse, ApiResponse};

/// Valve update; omitted valves are left unchanged.
#[derive(Debug, Deserialize)]
pub struct ValveRequest {
    pub inlet: Option<f64>,
    pub middle: Option<f64>,
    pub outlet: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CompressorRequest {
    pub active: Option<bool>,
    pub target_pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LeakRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct RunStateResponse {
    pub running: bool,
    /// False when the request found the loop already in the requested state
    pub changed: bool,
}

fn check_opening(name: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || !(0.0..=1.0).contains(&v) => {
            Err(format!("{name} must be a finite value within [0, 1] (got {v})"))
        }
        _ => Ok(()),
    }
}

/// POST /api/v1/valves
pub async fn set_valves(
    State(state): State<ApiState>,
    body: Result<Json<ValveRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    let checks = [
        check_opening("inlet", req.inlet),
        check_opening("middle", req.middle),
        check_opening("outlet", req.outlet),
    ];
    let problems: Vec<String> = checks.into_iter().filter_map(Result::err).collect();
    if !problems.is_empty() {
        return ApiErrorResponse::bad_request(problems.join("; "));
    }

    let controls = state.shared.update_controls(|c| {
        if let Some(v) = req.inlet {
            c.valves.inlet = v;
        }
        if let Some(v) = req.middle {
            c.valves.middle = v;
        }
        if let Some(v) = req.outlet {
            c.valves.outlet = v;
        }
    });
    info!(
        inlet = controls.valves.inlet,
        middle = controls.valves.middle,
        outlet = controls.valves.outlet,
        "Valves updated"
    );
    ApiResponse::ok(controls)
}

/// POST /api/v1/compressor
pub async fn set_compressor(
    State(state): State<ApiState>,
    body: Result<Json<CompressorRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    if let Some(p) = req.target_pressure {
        if !p.is_finite() || p < 0.0 {
            return ApiErrorResponse::bad_request(format!(
                "target_pressure must be a finite value >= 0 (got {p})"
            ));
        }
    }

    let controls = state.shared.update_controls(|c| {
        if let Some(active) = req.active {
            c.compressor_active = active;
        }
        if let Some(p) = req.target_pressure {
            c.target_pressure_psi = p;
        }
    });
    info!(
        active = controls.compressor_active,
        target_psi = controls.target_pressure_psi,
        "Compressor updated"
    );
    ApiResponse::ok(controls)
}

/// POST /api/v1/leak
pub async fn set_leak(
    State(state): State<ApiState>,
    body: Result<Json<LeakRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    let controls = state.shared.update_controls(|c| c.leak_enabled = req.enabled);
    info!(enabled = controls.leak_enabled, "Leak simulation toggled");
    ApiResponse::ok(controls)
}

/// POST /api/v1/simulation/start
pub async fn start_simulation(State(state): State<ApiState>) -> Response {
    match state.controller.start() {
        Ok(changed) => ApiResponse::ok(RunStateResponse {
            running: true,
            changed,
        }),
        Err(e) => {
            error!(error = %e, "Failed to start simulation");
            ApiErrorResponse::internal(e.to_string())
        }
    }
}

/// POST /api/v1/simulation/stop
pub async fn stop_simulation(State(state): State<ApiState>) -> Response {
    let changed = state.controller.stop().await;
    ApiResponse::ok(RunStateResponse {
        running: false,
        changed,
    })
}
