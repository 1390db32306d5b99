//! Cancellable periodic task runtime.
//!
//! A [`PeriodicTask`] drives one [`PeriodicJob`] at a fixed cadence: it
//! measures how long each iteration took and sleeps only for the remainder of
//! the period, so the cadence does not drift with the work's duration. The
//! run flag is a [`CancellationToken`] checked at the top of every iteration
//! and raced against the sleep.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::engine::SimulationEngine;
use super::SharedState;
use crate::types::{Controls, LeakState};

/// Delay before the next iteration: `max(0, target − elapsed)`.
pub fn next_delay(target: Duration, elapsed: Duration) -> Duration {
    target.saturating_sub(elapsed)
}

/// One unit of periodic work.
#[async_trait]
pub trait PeriodicJob: Send + 'static {
    /// Human-readable name for logging (e.g. "simulation", "hardware").
    fn name(&self) -> &str;

    /// Target time between iteration starts.
    fn period(&self) -> Duration;

    /// Run one iteration. `elapsed` is the wall-clock time since the previous
    /// iteration started (one period on the first call).
    ///
    /// Returning `Err` stops the task.
    async fn run_once(&mut self, elapsed: Duration) -> anyhow::Result<()>;
}

/// Drives a [`PeriodicJob`] until cancelled or until the job fails.
pub struct PeriodicTask<J: PeriodicJob> {
    job: J,
    cancel_token: CancellationToken,
}

impl<J: PeriodicJob> PeriodicTask<J> {
    pub fn new(job: J, cancel_token: CancellationToken) -> Self {
        Self { job, cancel_token }
    }

    /// Run the loop. Returns the number of completed iterations.
    pub async fn run(mut self) -> u64 {
        let period = self.job.period();
        let mut iterations = 0u64;
        let mut last_start: Option<Instant> = None;

        info!(job = self.job.name(), period_ms = period.as_millis() as u64, "Periodic task started");

        loop {
            if self.cancel_token.is_cancelled() {
                break;
            }

            let started = Instant::now();
            let elapsed = last_start.map_or(period, |prev| started.duration_since(prev));
            last_start = Some(started);

            if let Err(e) = self.job.run_once(elapsed).await {
                error!(job = self.job.name(), error = %e, "Periodic job failed, stopping");
                break;
            }
            iterations += 1;

            let work = started.elapsed();
            if work > period {
                debug!(job = self.job.name(), work_ms = work.as_millis() as u64, "Iteration overran its period");
            }

            tokio::select! {
                () = self.cancel_token.cancelled() => break,
                () = tokio::time::sleep(next_delay(period, work)) => {}
            }
        }

        info!(job = self.job.name(), iterations, "Periodic task stopped");
        iterations
    }
}

// ============================================================================
// Simulation Job
// ============================================================================

/// Steps the engine once per period and publishes the result.
pub struct SimulationJob {
    engine: SimulationEngine,
    shared: Arc<SharedState>,
    period: Duration,
}

impl SimulationJob {
    pub fn new(engine: SimulationEngine, shared: Arc<SharedState>, tick_rate_hz: f64) -> Self {
        Self {
            engine,
            shared,
            period: Duration::from_secs_f64(1.0 / tick_rate_hz),
        }
    }

    /// Step once from the published state; synchronous core of [`run_once`].
    ///
    /// [`run_once`]: PeriodicJob::run_once
    pub fn tick(&mut self, controls: &Controls, dt: f64) -> anyhow::Result<LeakState> {
        let prev = self.shared.snapshot();
        let next = self.engine.step(&prev, controls, dt)?;

        if next.leak_state != prev.leak_state {
            log_leak_transition(prev.leak_state, &next);
        }

        let leak_state = next.leak_state;
        self.shared.publish(next);
        Ok(leak_state)
    }
}

fn log_leak_transition(from: LeakState, next: &crate::types::SimulationState) {
    let max_confidence = next.max_confidence();
    match next.leak_state {
        LeakState::Normal => info!(
            %from,
            max_confidence,
            sim_time = next.sim_time,
            "Leak state returned to NORMAL"
        ),
        to => warn!(
            %from,
            %to,
            max_confidence,
            system_confidence = next.system_confidence,
            sim_time = next.sim_time,
            "Leak alarm"
        ),
    }
}

#[async_trait]
impl PeriodicJob for SimulationJob {
    fn name(&self) -> &str {
        "simulation"
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run_once(&mut self, elapsed: Duration) -> anyhow::Result<()> {
        let controls = self.shared.controls();
        self.tick(&controls, elapsed.as_secs_f64())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_next_delay_saturates() {
        let target = Duration::from_millis(200);
        assert_eq!(next_delay(target, Duration::from_millis(50)), Duration::from_millis(150));
        assert_eq!(next_delay(target, Duration::from_millis(200)), Duration::ZERO);
        assert_eq!(next_delay(target, Duration::from_millis(900)), Duration::ZERO);
    }

    struct Counter {
        count: Arc<AtomicU64>,
        fail_at: Option<u64>,
    }

    #[async_trait]
    impl PeriodicJob for Counter {
        fn name(&self) -> &str {
            "counter"
        }
        fn period(&self) -> Duration {
            Duration::from_millis(10)
        }
        async fn run_once(&mut self, _elapsed: Duration) -> anyhow::Result<()> {
            let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_at == Some(n) {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_stops_on_cancel() {
        let count = Arc::new(AtomicU64::new(0));
        let token = CancellationToken::new();
        let task = PeriodicTask::new(Counter { count: count.clone(), fail_at: None }, token.clone());
        let handle = tokio::spawn(task.run());

        tokio::time::sleep(Duration::from_millis(95)).await;
        token.cancel();
        let iterations = handle.await.unwrap();

        assert_eq!(iterations, count.load(Ordering::SeqCst));
        assert!((9..=11).contains(&iterations), "iterations {iterations}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_stops_on_job_error() {
        let count = Arc::new(AtomicU64::new(0));
        let task = PeriodicTask::new(
            Counter { count: count.clone(), fail_at: Some(3) },
            CancellationToken::new(),
        );
        let iterations = task.run().await;
        assert_eq!(iterations, 2);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let count = Arc::new(AtomicU64::new(0));
        let token = CancellationToken::new();
        token.cancel();
        let iterations = PeriodicTask::new(Counter { count: count.clone(), fail_at: None }, token)
            .run()
            .await;
        assert_eq!(iterations, 0);
    }
}
