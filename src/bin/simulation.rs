//! Headless pipeline simulation
//!
//! Steps the engine without a server or wall clock and streams the state to
//! stdout, one row every `--every` ticks. Leak-state transitions go to stderr
//! as a mission log.
//!
//! # Usage
//! ```bash
//! ./simulation --ticks 3000 --leak-at 5 --format csv > run.csv
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use pneumaguard::config::MonitorConfig;
use pneumaguard::types::{Controls, LeakState, SimulationState, ValveState};
use pneumaguard::SimulationEngine;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Headless pneumatic pipeline simulation")]
#[command(version)]
struct Args {
    /// Number of ticks to run
    #[arg(short, long, default_value = "3000")]
    ticks: u64,

    /// Random seed for the acoustic noise
    #[arg(long)]
    seed: Option<u64>,

    /// Enable the leak at this simulation time (seconds)
    #[arg(long, value_name = "SECS")]
    leak_at: Option<f64>,

    /// Inlet valve opening [0, 1]
    #[arg(long, default_value = "1.0")]
    inlet: f64,

    /// Middle valve opening [0, 1]
    #[arg(long, default_value = "1.0")]
    middle: f64,

    /// Outlet valve opening [0, 1]
    #[arg(long, default_value = "1.0")]
    outlet: f64,

    /// Compressor target pressure (psi); defaults to the configured value
    #[arg(long)]
    target: Option<f64>,

    /// Emit one row every N ticks
    #[arg(long, default_value = "60")]
    every: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Path to a monitor_config.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suppress the mission log
    #[arg(short, long)]
    quiet: bool,
}

/// One output row.
#[derive(Debug, Serialize)]
struct Row {
    tick: u64,
    sim_time: f64,
    compressor_psi: f64,
    point1_psi: f64,
    point2_psi: f64,
    system_psi: f64,
    flow_velocity: f64,
    leak_intensity: f64,
    rms: f64,
    peak_frequency_hz: f64,
    max_confidence: f64,
    leak_state: LeakState,
    system_confidence: f64,
}

impl From<&SimulationState> for Row {
    fn from(s: &SimulationState) -> Self {
        Self {
            tick: s.tick,
            sim_time: s.sim_time,
            compressor_psi: s.compressor.current_pressure,
            point1_psi: s.pressure.point1_psi,
            point2_psi: s.pressure.point2_psi,
            system_psi: s.pressure.system_psi,
            flow_velocity: s.pressure.flow_velocity,
            leak_intensity: s.leak.as_ref().map_or(0.0, |l| l.intensity),
            rms: s.acoustic.rms,
            peak_frequency_hz: s.acoustic.peak_frequency_hz,
            max_confidence: s.max_confidence(),
            leak_state: s.leak_state,
            system_confidence: s.system_confidence,
        }
    }
}

const CSV_HEADER: &str = "tick,sim_time,compressor_psi,point1_psi,point2_psi,system_psi,\
flow_velocity,leak_intensity,rms,peak_frequency_hz,max_confidence,leak_state,system_confidence";

fn csv_line(r: &Row) -> String {
    format!(
        "{},{:.4},{:.3},{:.3},{:.3},{:.3},{:.4},{:.3},{:.4},{:.1},{:.4},{},{:.4}",
        r.tick,
        r.sim_time,
        r.compressor_psi,
        r.point1_psi,
        r.point2_psi,
        r.system_psi,
        r.flow_velocity,
        r.leak_intensity,
        r.rms,
        r.peak_frequency_hz,
        r.max_confidence,
        r.leak_state,
        r.system_confidence
    )
}

fn log_event(quiet: bool, sim_time: f64, message: &str) {
    if !quiet {
        eprintln!("[t={sim_time:>8.2}s] {message}");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.every == 0 {
        bail!("--every must be at least 1");
    }

    let mut config = match &args.config {
        Some(path) => MonitorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }

    let dt = 1.0 / config.simulation.tick_rate_hz;
    let mut controls = Controls {
        valves: ValveState::clamped(args.inlet, args.middle, args.outlet),
        ..Controls::with_target(args.target.unwrap_or(config.physics.default_target_pressure_psi))
    };

    let mut engine = SimulationEngine::new(&config)?;
    let mut state = engine.initial_state(controls);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if matches!(args.format, OutputFormat::Csv) {
        writeln!(out, "{CSV_HEADER}")?;
    }

    log_event(args.quiet, 0.0, "Simulation started");

    for _ in 0..args.ticks {
        if let Some(at) = args.leak_at {
            if !controls.leak_enabled && state.sim_time >= at {
                controls.leak_enabled = true;
                log_event(args.quiet, state.sim_time, "Leak enabled");
            }
        }

        let next = engine.step(&state, &controls, dt)?;
        if next.leak_state != state.leak_state {
            log_event(
                args.quiet,
                next.sim_time,
                &format!(
                    "Leak state {} -> {} (confidence {:.2})",
                    state.leak_state,
                    next.leak_state,
                    next.max_confidence()
                ),
            );
        }
        state = next;

        if state.tick % args.every == 0 {
            let row = Row::from(&state);
            match args.format {
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&row)?)?,
                OutputFormat::Csv => writeln!(out, "{}", csv_line(&row))?,
            }
        }
    }

    out.flush()?;
    log_event(
        args.quiet,
        state.sim_time,
        &format!("Finished after {} ticks in state {}", state.tick, state.leak_state),
    );
    Ok(())
}
