//! Compressor, two-point pressure and flow model.
//!
//! Point 1 sits after the inlet valve, point 2 after the middle valve, and the
//! outlet valve vents point 2 to atmosphere:
//!
//! ```text
//! p1 = comp · inlet · (1 + k_back · (1 − middle))
//! p2 = p1 · middle · (1 − k_vent · (1 − outlet)) − leak_loss
//! ```

use crate::config::PhysicsConfig;
use crate::types::{CompressorState, Controls, LeakEvent, PressureReadings, ValveState};

use super::{exp_smooth, smoothing_factor};

#[derive(Debug, Clone)]
pub struct PressureModel {
    params: PhysicsConfig,
    reference_hz: f64,
}

impl PressureModel {
    pub fn new(params: &PhysicsConfig, reference_hz: f64) -> Self {
        Self {
            params: params.clone(),
            reference_hz,
        }
    }

    /// Smooth the compressor output toward its target, or toward 0 when idle.
    pub fn step_compressor(
        &self,
        prev: &CompressorState,
        controls: &Controls,
        dt: f64,
    ) -> CompressorState {
        let target = if controls.compressor_active {
            controls.target_pressure_psi.max(0.0)
        } else {
            0.0
        };
        let alpha = smoothing_factor(self.params.compressor_smoothing_rate, dt, self.reference_hz);
        CompressorState {
            active: controls.compressor_active,
            target_pressure: controls.target_pressure_psi,
            current_pressure: exp_smooth(prev.current_pressure, target, alpha).max(0.0),
        }
    }

    /// Unsmoothed point pressures for a given compressor output.
    ///
    /// `leak_intensity` is the intensity of the leak open on the previous tick.
    pub fn point_pressures(
        &self,
        valves: &ValveState,
        compressor_psi: f64,
        leak_intensity: Option<f64>,
    ) -> (f64, f64) {
        let p = &self.params;
        let p1 = compressor_psi
            * valves.inlet
            * (1.0 + p.upstream_backpressure_gain * (1.0 - valves.middle));

        let vent = (p.downstream_vent_gain * (1.0 - valves.outlet)).clamp(0.0, 1.0);
        let mut p2 = p1 * valves.middle * (1.0 - vent);

        if let Some(intensity) = leak_intensity {
            if p2 > p.leak_loss_floor_psi {
                let loss = (intensity * p.leak_loss_per_intensity).min(p.leak_loss_max_psi);
                p2 = (p2 - loss).max(0.0);
            }
        }

        (p1.max(0.0), p2)
    }

    /// Flow velocity the system settles at for these valves and pressure.
    pub fn steady_flow(&self, valves: &ValveState, system_psi: f64, compressor_active: bool) -> f64 {
        let gain = if compressor_active {
            self.params.flow_gain_active
        } else {
            self.params.flow_gain_idle
        };
        valves.inlet * valves.middle * valves.outlet * system_psi * gain
    }

    /// Advance the pressure readings by `dt`.
    ///
    /// `compressor` must already be stepped for this tick.
    pub fn step(
        &self,
        prev: &PressureReadings,
        valves: &ValveState,
        compressor: &CompressorState,
        leak: Option<&LeakEvent>,
        dt: f64,
    ) -> PressureReadings {
        let (p1, p2) = self.point_pressures(
            valves,
            compressor.current_pressure,
            leak.map(|l| l.intensity),
        );

        let system_alpha =
            smoothing_factor(self.params.system_pressure_smoothing_rate, dt, self.reference_hz);
        let system_psi = exp_smooth(prev.system_psi, (p1 + p2) / 2.0, system_alpha);

        let flow_target = self.steady_flow(valves, system_psi, compressor.active);
        let flow_alpha = smoothing_factor(self.params.flow_smoothing_rate, dt, self.reference_hz);
        let flow_velocity = exp_smooth(prev.flow_velocity, flow_target, flow_alpha);

        PressureReadings {
            point1_psi: p1,
            point2_psi: p2,
            system_psi,
            flow_velocity,
        }
    }
}
