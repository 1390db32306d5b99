//! Hardware telemetry record as exposed to consumers.

use serde::{Deserialize, Serialize};

/// Latest complete reading from the hardware sources.
///
/// Field names follow the device-side contract (camelCase).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HardwareTelemetry {
    pub inlet_pressure_psi: f64,
    pub outlet_pressure_psi: f64,
    pub system_pressure_psi: f64,
    pub inlet_voltage: f64,
    pub outlet_voltage: f64,
    pub leak_voltage: f64,
    pub leak_detected: bool,
    pub connected: bool,
    /// Epoch ms of the last complete cycle, 0 when none has succeeded
    pub last_update: i64,
}

/// Telemetry plus the spectrum of the hardware leak-voltage buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HardwareSnapshot {
    pub enabled: bool,
    pub telemetry: HardwareTelemetry,
    pub spectrum: Vec<f64>,
    pub samples_buffered: usize,
}
