//! Shared data structures for the pipeline model and its telemetry
//!
//! - `topology`: pipe segments and sensor nodes
//! - `state`: controls and the per-tick simulation snapshot
//! - `telemetry`: hardware telemetry record

mod state;
mod telemetry;
mod topology;

pub use state::*;
pub use telemetry::*;
pub use topology::*;
