//! PneumaGuard - pneumatic pipeline simulation and acoustic leak monitor
//!
//! Runs the tick-based simulation, optionally polls real pressure/voltage
//! sources, and serves the JSON API plus a WebSocket live feed.
//!
//! # Usage
//!
//! ```bash
//! # Serve on the configured address with the simulation running
//! cargo run --release
//!
//! # Custom config, start paused, reproducible noise
//! ./pneumaguard --config bench.toml --no-autostart --seed 7
//! ```
//!
//! # Environment Variables
//!
//! - `PNEUMAGUARD_CONFIG`: Path to the TOML config (default: ./monitor_config.toml)
//! - `PNEUMAGUARD_ADDR`: Override the server address
//! - `PNEUMAGUARD_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use pneumaguard::acquisition::HardwarePollJob;
use pneumaguard::api::{create_app, ApiState};
use pneumaguard::config::MonitorConfig;
use pneumaguard::pipeline::{PeriodicTask, SharedState, SimulationController, SimulationEngine};
use pneumaguard::types::{Controls, HardwareSnapshot};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "pneumaguard")]
#[command(about = "Pneumatic pipeline simulation and acoustic leak monitor")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default from config: "0.0.0.0:8080")
    #[arg(short, long, env = "PNEUMAGUARD_ADDR")]
    addr: Option<String>,

    /// Path to a monitor_config.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the acoustic noise seed
    #[arg(long)]
    seed: Option<u64>,

    /// Do not start the simulation loop at boot (POST /api/v1/simulation/start)
    #[arg(long)]
    no_autostart: bool,
}

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    HardwarePoller,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpServer => write!(f, "HttpServer"),
            Self::HardwarePoller => write!(f, "HardwarePoller"),
        }
    }
}

fn load_config(args: &CliArgs) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::load(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if args.no_autostart {
        config.simulation.autostart = false;
    }
    if let Some(addr) = &args.addr {
        config.server.addr.clone_from(addr);
    }
    Ok(config)
}

// ============================================================================
// Task Spawning
// ============================================================================

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Spawn the hardware poller when any source URL is configured.
fn spawn_hardware_poller(
    task_set: &mut JoinSet<Result<TaskName>>,
    config: &MonitorConfig,
    shared: Arc<SharedState>,
    cancel_token: CancellationToken,
) -> Result<()> {
    let job = HardwarePollJob::new(&config.hardware, config.spectrum.smoothing_alpha, shared)
        .context("Failed to build hardware client")?;
    info!(
        poll_ms = config.hardware.poll_interval_ms,
        buffer = config.hardware.buffer_size,
        "Hardware polling enabled"
    );
    task_set.spawn(async move {
        let cycles = PeriodicTask::new(job, cancel_token).run().await;
        info!("[HardwarePoller] Stopped after {} cycles", cycles);
        Ok(TaskName::HardwarePoller)
    });
    Ok(())
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // drain so the server finishes its graceful shutdown
    while let Some(result) = task_set.join_next().await {
        if let Ok(Err(e)) = result {
            warn!("Task ended with error during shutdown: {}", e);
        }
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = Arc::new(load_config(&args)?);

    info!("PneumaGuard - pneumatic leak monitor");
    info!(
        site = %config.site.name,
        tick_rate_hz = config.simulation.tick_rate_hz,
        fft_size = config.acoustic.fft_size,
        sample_rate_hz = config.acoustic.sample_rate_hz,
        "Configuration loaded"
    );

    let engine = SimulationEngine::new(&config).context("Failed to build simulation engine")?;
    let initial =
        engine.initial_state(Controls::with_target(config.physics.default_target_pressure_psi));
    let hardware = HardwareSnapshot {
        enabled: config.hardware.is_enabled(),
        ..HardwareSnapshot::default()
    };
    let shared = Arc::new(SharedState::new(
        initial,
        engine.topology().segments.clone(),
        hardware,
    ));
    drop(engine);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let controller = Arc::new(SimulationController::new(
        Arc::clone(&config),
        Arc::clone(&shared),
        cancel_token.clone(),
    ));
    if config.simulation.autostart {
        controller.start().context("Failed to start simulation")?;
    } else {
        info!("Simulation paused until POST /api/v1/simulation/start");
    }

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    if config.hardware.is_enabled() {
        spawn_hardware_poller(&mut task_set, &config, Arc::clone(&shared), cancel_token.clone())?;
    }

    let app = create_app(ApiState {
        shared,
        controller: Arc::clone(&controller),
        config: Arc::clone(&config),
    });
    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.addr))?;
    info!("HTTP server listening on http://{}", config.server.addr);
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());

    let result = run_supervisor(&mut task_set, cancel_token).await;
    controller.stop().await;
    info!("Shutdown complete");
    result
}
