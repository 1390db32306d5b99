//! Controls and the per-tick simulation snapshot.

use serde::{Deserialize, Serialize};

use super::{SensorNode, Vec3};

// ============================================================================
// Controls
// ============================================================================

/// Valve openings, each in [0, 1] (0 = closed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValveState {
    pub inlet: f64,
    pub middle: f64,
    pub outlet: f64,
}

impl ValveState {
    pub const FULLY_OPEN: Self = Self {
        inlet: 1.0,
        middle: 1.0,
        outlet: 1.0,
    };

    /// Build a valve state, clamping each opening into [0, 1].
    ///
    /// Non-finite openings are treated as closed.
    pub fn clamped(inlet: f64, middle: f64, outlet: f64) -> Self {
        Self {
            inlet: clamp_opening(inlet),
            middle: clamp_opening(middle),
            outlet: clamp_opening(outlet),
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.inlet, self.middle, self.outlet]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

fn clamp_opening(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl Default for ValveState {
    fn default() -> Self {
        Self::FULLY_OPEN
    }
}

/// Externally settable inputs, read once at the start of every tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Controls {
    pub valves: ValveState,
    pub compressor_active: bool,
    pub target_pressure_psi: f64,
    pub leak_enabled: bool,
}

impl Controls {
    pub fn with_target(target_pressure_psi: f64) -> Self {
        Self {
            valves: ValveState::FULLY_OPEN,
            compressor_active: true,
            target_pressure_psi,
            leak_enabled: false,
        }
    }
}

// ============================================================================
// Model State
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct CompressorState {
    pub active: bool,
    pub target_pressure: f64,
    /// Tick-smoothed output pressure (PSI)
    pub current_pressure: f64,
}

/// Smoothed outputs of the pressure/flow model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PressureReadings {
    /// Point 1, after the inlet valve (PSI)
    pub point1_psi: f64,
    /// Point 2, after the middle valve (PSI)
    pub point2_psi: f64,
    pub system_psi: f64,
    /// m/s
    pub flow_velocity: f64,
}

/// An open leak. Exists only while enabled and pressurised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeakEvent {
    pub segment_id: String,
    pub position: Vec3,
    /// In [0, 100], non-decreasing while the event lives
    pub intensity: f64,
    /// Intensity units per second
    pub growth_rate: f64,
    /// Simulation time at creation (seconds)
    pub start_time: f64,
}

/// Global alert state derived from the maximum node confidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeakState {
    #[default]
    Normal,
    Detected,
    Critical,
}

impl LeakState {
    pub const fn is_alarm(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl std::fmt::Display for LeakState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Detected => write!(f, "DETECTED"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Time-domain statistics of the latest synthetic buffer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AcousticSummary {
    pub peak_amplitude: f64,
    pub rms: f64,
    pub peak_frequency_hz: f64,
    pub spectral_energy: f64,
}

/// Complete engine state after one tick. Published whole, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationState {
    /// Simulation seconds since engine creation
    pub sim_time: f64,
    pub tick: u64,
    pub controls: Controls,
    pub compressor: CompressorState,
    pub pressure: PressureReadings,
    pub leak: Option<LeakEvent>,
    pub nodes: Vec<SensorNode>,
    /// Smoothed display spectrum
    pub spectrum: Vec<f64>,
    pub acoustic: AcousticSummary,
    pub leak_state: LeakState,
    pub system_confidence: f64,
}

impl SimulationState {
    pub fn max_confidence(&self) -> f64 {
        crate::detection::LeakClassifier::max_confidence(&self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valve_clamping() {
        let v = ValveState::clamped(-0.5, 0.4, 7.0);
        assert_eq!(v, ValveState { inlet: 0.0, middle: 0.4, outlet: 1.0 });
        assert!(v.is_valid());

        let nan = ValveState::clamped(f64::NAN, 1.0, 1.0);
        assert_eq!(nan.inlet, 0.0);
    }

    #[test]
    fn test_leak_state_serializes_uppercase() {
        let json = serde_json::to_string(&LeakState::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
        assert!(LeakState::Detected.is_alarm());
        assert!(!LeakState::Normal.is_alarm());
    }
}
