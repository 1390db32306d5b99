//! Processing Pipeline Module
//!
//! ```text
//! SimulationController ── start/stop ──▶ PeriodicTask<SimulationJob> (60 Hz)
//!                                             │ SimulationEngine::step
//!                                             ▼
//!                         SharedState (ArcSwap snapshots) ◀── HardwarePollJob (5 Hz)
//!                                             │
//!                                             ▼
//!                                   API handlers / live feed
//! ```

mod controller;
mod engine;
pub mod processing_loop;
pub mod source;
mod state;

pub use controller::SimulationController;
pub use engine::{EngineError, SimulationEngine};
pub use processing_loop::{next_delay, PeriodicJob, PeriodicTask, SimulationJob};
pub use source::{SignalSource, SpectralPipeline, SpectrumResult};
pub use state::SharedState;
