//! Simulation engine: one tick is a pure transition
//! `(state, controls, dt) -> state'`.
//!
//! ```text
//! compressor → pressure/flow → leak lifecycle → synthesis → FFT
//!            → binning/smoothing → sensor nodes → classification
//! ```
//!
//! The engine owns only immutable model parameters and the synthesizer's RNG;
//! all evolving state lives in [`SimulationState`], so several engines can run
//! side by side (tests do exactly that).

use thiserror::Error;
use tracing::error;

use super::source::SpectralPipeline;
use crate::acoustics::{AcousticInputs, AcousticSynthesizer};
use crate::config::MonitorConfig;
use crate::detection::{LeakClassifier, NodeUpdater, TickObservation};
use crate::physics_engine::{LeakModel, PressureModel};
use crate::processing::ProcessingError;
use crate::types::{
    AcousticSummary, CompressorState, Controls, LeakState, PipelineTopology, PressureReadings,
    SimulationState, ValveState,
};

/// Errors raised while building or stepping the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Leak segment '{0}' is not part of the pipeline topology")]
    UnknownSegment(String),

    #[error("Spectral analysis failed: {0}")]
    Spectral(#[from] ProcessingError),

    #[error("Non-finite {field} at tick {tick}")]
    NonFinite { field: &'static str, tick: u64 },
}

pub struct SimulationEngine {
    topology: PipelineTopology,
    pressure: PressureModel,
    leak: LeakModel,
    synthesizer: AcousticSynthesizer,
    spectral: SpectralPipeline,
    nodes: NodeUpdater,
    classifier: LeakClassifier,
    max_dt: f64,
    /// Wall-clock epoch (ms) corresponding to `sim_time == 0`
    epoch_ms: i64,
}

impl SimulationEngine {
    /// Engine on the reference bench topology.
    pub fn new(config: &MonitorConfig) -> Result<Self, EngineError> {
        Self::with_topology(config, PipelineTopology::reference())
    }

    pub fn with_topology(
        config: &MonitorConfig,
        topology: PipelineTopology,
    ) -> Result<Self, EngineError> {
        let reference_hz = config.simulation.tick_rate_hz;
        let leak_segment = topology
            .segment(&config.leak.segment_id)
            .ok_or_else(|| EngineError::UnknownSegment(config.leak.segment_id.clone()))?;
        let leak = LeakModel::new(&config.leak, leak_segment);

        Ok(Self {
            pressure: PressureModel::new(&config.physics, reference_hz),
            leak,
            synthesizer: AcousticSynthesizer::new(&config.acoustic, config.simulation.seed),
            spectral: SpectralPipeline::new(
                config.spectrum.display_bins,
                config.spectrum.smoothing_alpha,
            ),
            nodes: NodeUpdater::new(&config.detection, reference_hz),
            classifier: LeakClassifier::new(&config.detection),
            max_dt: config.simulation.max_tick_dt_secs,
            epoch_ms: chrono::Utc::now().timestamp_millis(),
            topology,
        })
    }

    pub fn topology(&self) -> &PipelineTopology {
        &self.topology
    }

    /// Re-anchor feature timestamps so that `sim_time` maps to "now".
    ///
    /// Used when an engine resumes from a previously published state.
    pub fn anchor_clock(&mut self, sim_time: f64) {
        self.epoch_ms = chrono::Utc::now().timestamp_millis() - secs_to_ms(sim_time);
    }

    /// Quiescent state: depressurised, no leak, empty spectrum.
    pub fn initial_state(&self, controls: Controls) -> SimulationState {
        SimulationState {
            sim_time: 0.0,
            tick: 0,
            controls,
            compressor: CompressorState {
                active: controls.compressor_active,
                target_pressure: controls.target_pressure_psi,
                current_pressure: 0.0,
            },
            pressure: PressureReadings::default(),
            leak: None,
            nodes: self.topology.nodes.clone(),
            spectrum: vec![0.0; self.spectral.display_bins()],
            acoustic: AcousticSummary::default(),
            leak_state: LeakState::Normal,
            system_confidence: self.classifier.system_confidence(0.0),
        }
    }

    /// Advance `prev` by `dt` seconds under `controls`.
    ///
    /// `dt` is clamped to `[0, max_tick_dt_secs]`; a non-finite `dt` counts as 0.
    pub fn step(
        &mut self,
        prev: &SimulationState,
        controls: &Controls,
        dt: f64,
    ) -> Result<SimulationState, EngineError> {
        let dt = if dt.is_finite() { dt.clamp(0.0, self.max_dt) } else { 0.0 };
        let controls = Controls {
            valves: ValveState::clamped(
                controls.valves.inlet,
                controls.valves.middle,
                controls.valves.outlet,
            ),
            target_pressure_psi: if controls.target_pressure_psi.is_finite() {
                controls.target_pressure_psi.max(0.0)
            } else {
                prev.controls.target_pressure_psi
            },
            ..*controls
        };
        let tick = prev.tick + 1;
        let sim_time = prev.sim_time + dt;

        let compressor = self.pressure.step_compressor(&prev.compressor, &controls, dt);
        let pressure = self.pressure.step(
            &prev.pressure,
            &controls.valves,
            &compressor,
            prev.leak.as_ref(),
            dt,
        );
        let leak = self.leak.step(
            prev.leak.as_ref(),
            controls.leak_enabled,
            compressor.current_pressure,
            sim_time,
        );

        let frame = self.synthesizer.synthesize(&AcousticInputs {
            compressor_active: compressor.active,
            leak_intensity: leak.as_ref().map(|l| l.intensity),
            system_pressure_psi: pressure.system_psi,
            middle_valve: controls.valves.middle,
            sim_time: prev.sim_time,
        });
        let spectrum = self.spectral.process(&frame, &prev.spectrum)?;

        let nodes = self.nodes.update(
            &prev.nodes,
            &TickObservation {
                pressure,
                compressor_active: compressor.active,
                leak_active: leak.is_some(),
                rms: frame.rms,
                peak_amplitude: frame.peak,
                spectrum: spectrum.features,
                dt,
                timestamp_ms: self.epoch_ms + secs_to_ms(sim_time),
            },
        );

        let max_confidence = LeakClassifier::max_confidence(&nodes);

        let next = SimulationState {
            sim_time,
            tick,
            controls,
            compressor,
            pressure,
            leak,
            nodes,
            spectrum: spectrum.display,
            acoustic: AcousticSummary {
                peak_amplitude: frame.peak,
                rms: frame.rms,
                peak_frequency_hz: spectrum.features.peak_frequency_hz,
                spectral_energy: spectrum.features.energy,
            },
            leak_state: self.classifier.classify(max_confidence),
            system_confidence: self.classifier.system_confidence(max_confidence),
        };

        check_finite(&next)?;
        Ok(next)
    }
}

fn secs_to_ms(secs: f64) -> i64 {
    // saturating float-to-int cast
    (secs * 1000.0).round() as i64
}

fn check_finite(state: &SimulationState) -> Result<(), EngineError> {
    let fields = [
        ("compressor pressure", state.compressor.current_pressure),
        ("system pressure", state.pressure.system_psi),
        ("flow velocity", state.pressure.flow_velocity),
        ("acoustic rms", state.acoustic.rms),
        ("system confidence", state.system_confidence),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            error!(field, tick = state.tick, "Engine produced a non-finite value");
            debug_assert!(value.is_finite(), "non-finite {field}");
            return Err(EngineError::NonFinite {
                field,
                tick: state.tick,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_unknown_leak_segment_is_rejected() {
        let mut config = MonitorConfig::default();
        config.leak.segment_id = "nowhere".into();
        assert!(matches!(
            SimulationEngine::new(&config),
            Err(EngineError::UnknownSegment(id)) if id == "nowhere"
        ));
    }

    #[test]
    fn test_initial_state_shape() {
        let engine = SimulationEngine::new(&MonitorConfig::default()).unwrap();
        let state = engine.initial_state(Controls::with_target(100.0));
        assert_eq!(state.spectrum.len(), 128);
        assert_eq!(state.nodes.len(), 4);
        assert!(state.leak.is_none());
        assert_eq!(state.leak_state, LeakState::Normal);
    }

    #[test]
    fn test_step_advances_time_and_tick() {
        let mut engine = SimulationEngine::new(&MonitorConfig::default()).unwrap();
        let controls = Controls::with_target(100.0);
        let s0 = engine.initial_state(controls);
        let s1 = engine.step(&s0, &controls, DT).unwrap();
        assert_eq!(s1.tick, 1);
        assert!((s1.sim_time - DT).abs() < 1e-12);
        assert!(s1.compressor.current_pressure > 0.0);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut engine = SimulationEngine::new(&MonitorConfig::default()).unwrap();
        let controls = Controls::with_target(100.0);
        let s0 = engine.initial_state(controls);
        let s1 = engine.step(&s0, &controls, 10.0).unwrap();
        assert!((s1.sim_time - 0.25).abs() < 1e-12);
        let s2 = engine.step(&s1, &controls, f64::NAN).unwrap();
        assert_eq!(s2.sim_time, s1.sim_time);
    }

    #[test]
    fn test_out_of_range_controls_are_sanitised() {
        let mut engine = SimulationEngine::new(&MonitorConfig::default()).unwrap();
        let mut controls = Controls::with_target(f64::INFINITY);
        controls.valves.inlet = 3.0;
        let s0 = engine.initial_state(Controls::with_target(100.0));
        let s1 = engine.step(&s0, &controls, DT).unwrap();
        assert!(s1.controls.valves.is_valid());
        assert_eq!(s1.controls.target_pressure_psi, 100.0);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let config = MonitorConfig::default();
        let mut a = SimulationEngine::new(&config).unwrap();
        let mut b = SimulationEngine::new(&config).unwrap();
        let controls = Controls { leak_enabled: true, ..Controls::with_target(100.0) };
        let mut sa = a.initial_state(controls);
        let mut sb = b.initial_state(controls);
        for _ in 0..120 {
            sa = a.step(&sa, &controls, DT).unwrap();
            sb = b.step(&sb, &controls, DT).unwrap();
        }
        assert_eq!(sa.spectrum, sb.spectrum);
        assert_eq!(sa.acoustic, sb.acoustic);
        assert_eq!(sa.leak, sb.leak);
    }
}
