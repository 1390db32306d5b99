//! PneumaGuard: pneumatic pipeline simulation and acoustic leak detection
//!
//! ## Architecture
//!
//! - **Physics Engine**: compressor, valve pressure/flow and leak lifecycle
//! - **Acoustics**: ultrasonic signal synthesis driven by the physical state
//! - **Processing**: radix-2 FFT, spectral features, display binning/smoothing
//! - **Detection**: per-sensor node updates and the leak state machine
//! - **Pipeline**: the tick engine, shared snapshots and the periodic runtime
//! - **Acquisition**: HTTP polling of real pressure/voltage sources
//! - **API**: JSON endpoints and WebSocket live feed

pub mod acoustics;
pub mod acquisition;
pub mod api;
pub mod config;
pub mod detection;
pub mod physics_engine;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use config::MonitorConfig;

pub use types::{
    Controls, HardwareSnapshot, HardwareTelemetry, LeakEvent, LeakState, PipeSegment,
    PipelineTopology, SensorMeasurement, SensorNode, SimulationState, ValveState,
};

pub use pipeline::{EngineError, SharedState, SimulationController, SimulationEngine};
