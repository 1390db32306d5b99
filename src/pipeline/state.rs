//! Shared state sink.
//!
//! Every consumer (API handlers, the live feed, the periodic jobs) reads whole
//! immutable snapshots through [`ArcSwap`]; writers build the next value and
//! publish it in one atomic store. Nothing is ever patched in place.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;

use crate::types::{Controls, HardwareSnapshot, PipeSegment, SimulationState};

/// Shared application state accessible from API handlers and periodic jobs.
pub struct SharedState {
    snapshot: ArcSwap<SimulationState>,
    controls: ArcSwap<Controls>,
    hardware: ArcSwap<HardwareSnapshot>,
    geometry: Arc<Vec<PipeSegment>>,
    started_at: Instant,
}

impl SharedState {
    pub fn new(
        initial: SimulationState,
        geometry: Vec<PipeSegment>,
        hardware: HardwareSnapshot,
    ) -> Self {
        Self {
            controls: ArcSwap::from_pointee(initial.controls),
            snapshot: ArcSwap::from_pointee(initial),
            hardware: ArcSwap::from_pointee(hardware),
            geometry: Arc::new(geometry),
            started_at: Instant::now(),
        }
    }

    /// Latest published simulation state.
    pub fn snapshot(&self) -> Arc<SimulationState> {
        self.snapshot.load_full()
    }

    pub fn publish(&self, state: SimulationState) {
        self.snapshot.store(Arc::new(state));
    }

    /// Controls the next tick will read.
    pub fn controls(&self) -> Controls {
        **self.controls.load()
    }

    /// Apply `f` to the current controls and publish the result atomically.
    ///
    /// Concurrent updates are retried, so no change is lost.
    /// `f` may run more than once; the value returned is the one that was
    /// actually stored.
    pub fn update_controls<F>(&self, mut f: F) -> Controls
    where
        F: FnMut(&mut Controls),
    {
        let mut published = self.controls();
        self.controls.rcu(|current| {
            let mut next = **current;
            f(&mut next);
            published = next;
            next
        });
        published
    }

    pub fn hardware(&self) -> Arc<HardwareSnapshot> {
        self.hardware.load_full()
    }

    pub fn publish_hardware(&self, snapshot: HardwareSnapshot) {
        self.hardware.store(Arc::new(snapshot));
    }

    pub fn geometry(&self) -> Arc<Vec<PipeSegment>> {
        Arc::clone(&self.geometry)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::pipeline::SimulationEngine;

    fn shared() -> SharedState {
        let engine = SimulationEngine::new(&MonitorConfig::default()).unwrap();
        let initial = engine.initial_state(Controls::with_target(100.0));
        SharedState::new(initial, engine.topology().segments.clone(), HardwareSnapshot::default())
    }

    #[test]
    fn test_update_controls_returns_published_value() {
        let state = shared();
        let next = state.update_controls(|c| c.valves.outlet = 0.25);
        assert_eq!(next.valves.outlet, 0.25);
        assert_eq!(state.controls().valves.outlet, 0.25);
        assert_eq!(state.controls().valves.inlet, 1.0);
    }

    #[test]
    fn test_update_controls_applies_increment_once() {
        let state = shared();
        let mut calls = 0;
        let next = state.update_controls(|c| {
            calls += 1;
            c.target_pressure_psi += 1.0;
        });
        assert_eq!(calls, 1);
        assert_eq!(next.target_pressure_psi, 101.0);
        assert_eq!(next, state.controls());

        let again = state.update_controls(|c| c.target_pressure_psi += 1.0);
        assert_eq!(again.target_pressure_psi, 102.0);
        assert_eq!(again, state.controls());
    }

    #[test]
    fn test_publish_replaces_snapshot() {
        let state = shared();
        let before = state.snapshot();
        let mut next = (*before).clone();
        next.tick = 42;
        state.publish(next);
        assert_eq!(state.snapshot().tick, 42);
        // readers holding the old Arc keep a consistent view
        assert_eq!(before.tick, 0);
    }
}
