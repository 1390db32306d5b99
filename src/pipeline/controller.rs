//! Idempotent start/stop of the simulation loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::engine::{EngineError, SimulationEngine};
use super::processing_loop::{PeriodicTask, SimulationJob};
use super::SharedState;
use crate::config::MonitorConfig;

struct RunningLoop {
    cancel_token: CancellationToken,
    handle: JoinHandle<u64>,
}

/// Owns the simulation task. At most one loop runs at a time.
///
/// Each start builds a fresh engine from the config and resumes from the last
/// published snapshot, so stopping and restarting keeps the pipeline state.
pub struct SimulationController {
    config: Arc<MonitorConfig>,
    shared: Arc<SharedState>,
    shutdown: CancellationToken,
    running: Mutex<Option<RunningLoop>>,
}

impl SimulationController {
    /// `shutdown` cancels any running loop when the process shuts down.
    pub fn new(
        config: Arc<MonitorConfig>,
        shared: Arc<SharedState>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            shared,
            shutdown,
            running: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<RunningLoop>> {
        // the guarded data is a plain handle; a poisoned lock is still usable
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the loop. Returns `Ok(false)` if it was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<bool, EngineError> {
        let mut running = self.lock();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            debug!("Simulation already running, start ignored");
            return Ok(false);
        }

        let mut engine = SimulationEngine::new(&self.config)?;
        engine.anchor_clock(self.shared.snapshot().sim_time);

        let cancel_token = self.shutdown.child_token();
        let job = SimulationJob::new(
            engine,
            Arc::clone(&self.shared),
            self.config.simulation.tick_rate_hz,
        );
        let handle = tokio::spawn(PeriodicTask::new(job, cancel_token.clone()).run());

        *running = Some(RunningLoop {
            cancel_token,
            handle,
        });
        info!(tick_rate_hz = self.config.simulation.tick_rate_hz, "Simulation started");
        Ok(true)
    }

    /// Stop the loop and wait for it to exit. Returns `false` if it was not running.
    pub async fn stop(&self) -> bool {
        let Some(run) = self.lock().take() else {
            debug!("Simulation not running, stop ignored");
            return false;
        };

        run.cancel_token.cancel();
        match run.handle.await {
            Ok(ticks) => info!(ticks, "Simulation stopped"),
            Err(e) => tracing::warn!(error = %e, "Simulation task ended abnormally"),
        }
        true
    }

    /// True while a loop is live. A loop that stopped on an engine error counts
    /// as not running.
    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HardwareSnapshot;
    use std::time::Duration;

    fn controller() -> (SimulationController, Arc<SharedState>) {
        let config = Arc::new(MonitorConfig::default());
        let engine = SimulationEngine::new(&config).unwrap();
        let initial = engine.initial_state(crate::types::Controls::with_target(100.0));
        let shared = Arc::new(SharedState::new(
            initial,
            engine.topology().segments.clone(),
            HardwareSnapshot::default(),
        ));
        let ctl = SimulationController::new(config, Arc::clone(&shared), CancellationToken::new());
        (ctl, shared)
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (ctl, _) = controller();
        assert!(ctl.start().unwrap());
        assert!(!ctl.start().unwrap());
        assert!(ctl.is_running());
        assert!(ctl.stop().await);
        assert!(!ctl.stop().await);
        assert!(!ctl.is_running());
    }

    #[tokio::test]
    async fn test_restart_resumes_from_snapshot() {
        let (ctl, shared) = controller();
        ctl.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        ctl.stop().await;
        let paused_at = shared.snapshot().tick;
        assert!(paused_at > 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(shared.snapshot().tick, paused_at);

        ctl.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        ctl.stop().await;
        assert!(shared.snapshot().tick > paused_at);
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_loop() {
        let config = Arc::new(MonitorConfig::default());
        let engine = SimulationEngine::new(&config).unwrap();
        let shared = Arc::new(SharedState::new(
            engine.initial_state(crate::types::Controls::with_target(100.0)),
            Vec::new(),
            HardwareSnapshot::default(),
        ));
        let shutdown = CancellationToken::new();
        let ctl = SimulationController::new(config, shared, shutdown.clone());
        ctl.start().unwrap();
        shutdown.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!ctl.is_running());
    }
}
