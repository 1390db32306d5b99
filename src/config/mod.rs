//! Monitor Configuration Module
//!
//! Per-site configuration loaded from TOML files. Every physical and acoustic
//! constant of the engine is an operator-tunable value.
//!
//! ## Loading Order
//!
//! 1. `PNEUMAGUARD_CONFIG` environment variable (path to TOML file)
//! 2. `monitor_config.toml` in the current working directory
//! 3. Built-in defaults from [`defaults`]
//!
//! ## Usage
//!
//! The config is loaded once at startup and passed by value or `Arc` to the
//! components that need it; there is no process-wide instance, so tests can
//! run engines with different configurations side by side.
//!
//! ```ignore
//! let config = MonitorConfig::load();
//! let engine = SimulationEngine::new(&config)?;
//! ```

pub mod defaults;
mod monitor_config;
pub mod validation;

pub use monitor_config::*;
