//! Read-only endpoints: health, state, geometry, nodes, spectrum, hardware

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use super::ApiState;
use crate::api::envelope::ApiResponse;
use crate::types::{LeakState, SimulationState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub site: String,
    pub running: bool,
    pub uptime_secs: u64,
    pub tick: u64,
    pub leak_state: LeakState,
    pub hardware_enabled: bool,
    pub hardware_connected: bool,
}

/// GET /health
pub async fn get_health(State(state): State<ApiState>) -> Response {
    let snapshot = state.shared.snapshot();
    let hardware = state.shared.hardware();
    ApiResponse::ok(HealthResponse {
        status: "ok",
        site: state.config.site.name.clone(),
        running: state.controller.is_running(),
        uptime_secs: state.shared.uptime_secs(),
        tick: snapshot.tick,
        leak_state: snapshot.leak_state,
        hardware_enabled: hardware.enabled,
        hardware_connected: hardware.telemetry.connected,
    })
}

#[derive(Debug, Serialize)]
pub struct StateResponse<'a> {
    pub running: bool,
    #[serde(flatten)]
    pub state: &'a SimulationState,
}

/// GET /api/v1/state - full simulation snapshot
pub async fn get_state(State(state): State<ApiState>) -> Response {
    let snapshot = state.shared.snapshot();
    ApiResponse::ok(StateResponse {
        running: state.controller.is_running(),
        state: &snapshot,
    })
}

/// GET /api/v1/geometry
pub async fn get_geometry(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(&*state.shared.geometry())
}

/// GET /api/v1/nodes
pub async fn get_nodes(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(&state.shared.snapshot().nodes)
}

#[derive(Debug, Serialize)]
pub struct SpectrumResponse<'a> {
    pub bins: &'a [f64],
    /// Width of one display bin (Hz)
    pub bin_width_hz: f64,
    pub peak_frequency_hz: f64,
    pub spectral_energy: f64,
    pub rms: f64,
}

/// GET /api/v1/spectrum - smoothed display spectrum of the synthetic signal
pub async fn get_spectrum(State(state): State<ApiState>) -> Response {
    let snapshot = state.shared.snapshot();
    let nyquist = state.config.acoustic.sample_rate_hz / 2.0;
    let bins = snapshot.spectrum.len().max(1);
    ApiResponse::ok(SpectrumResponse {
        bins: &snapshot.spectrum,
        bin_width_hz: nyquist / bins as f64,
        peak_frequency_hz: snapshot.acoustic.peak_frequency_hz,
        spectral_energy: snapshot.acoustic.spectral_energy,
        rms: snapshot.acoustic.rms,
    })
}

/// GET /api/v1/hardware
pub async fn get_hardware(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(&*state.shared.hardware())
}
