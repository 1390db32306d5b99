//! API route handlers
//!
//! - `status`: health and read-only views of the published snapshots
//! - `controls`: valve, compressor, leak and run-state setters
//! - `live`: WebSocket snapshot stream

mod controls;
mod live;
mod status;

pub use controls::*;
pub use live::*;
pub use status::*;

use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::pipeline::{SharedState, SimulationController};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Published snapshots and controls
    pub shared: Arc<SharedState>,
    /// Simulation loop lifecycle
    pub controller: Arc<SimulationController>,
    pub config: Arc<MonitorConfig>,
}
