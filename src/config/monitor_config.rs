//! Monitor Configuration - every model constant as an operator-tunable TOML value
//!
//! Each section implements `Default` with the values from [`super::defaults`],
//! so a missing file, section or key always falls back to the reference model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PNEUMAGUARD_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "monitor_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one monitored pipeline.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$PNEUMAGUARD_CONFIG` env var
/// 2. `./monitor_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Site identification
    #[serde(default)]
    pub site: SiteInfo,

    /// Tick loop settings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Pressure/flow model constants
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Leak lifecycle constants
    #[serde(default)]
    pub leak: LeakConfig,

    /// Acoustic synthesizer settings
    #[serde(default)]
    pub acoustic: AcousticConfig,

    /// Spectrum display settings
    #[serde(default)]
    pub spectrum: SpectrumConfig,

    /// Confidence and classification thresholds
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Hardware telemetry sources
    #[serde(default)]
    pub hardware: HardwareConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PNEUMAGUARD_CONFIG` environment variable
    /// 2. `./monitor_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), site = %config.site.name, "Loaded monitor config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(site = %config.site.name, "Loaded monitor config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings and never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        for w in super::validation::validate_physical_ranges(&config) {
            warn!(field = %w.field, "{}", w);
        }
        Ok(config)
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate every section for internal consistency.
    ///
    /// Rules:
    /// - Buffer sizes must be powers of two
    /// - Smoothing rates must lie in (0, 1]
    /// - Classification thresholds must escalate within [0, 1]
    /// - Tones must sit below the Nyquist frequency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let s = &self.simulation;
        check_loop_rate(s.tick_rate_hz, "simulation.tick_rate_hz", &mut errors);
        check_positive(s.max_tick_dt_secs, "simulation.max_tick_dt_secs", &mut errors);

        let p = &self.physics;
        check_rate(p.compressor_smoothing_rate, "physics.compressor_smoothing_rate", &mut errors);
        check_rate(p.system_pressure_smoothing_rate, "physics.system_pressure_smoothing_rate", &mut errors);
        check_rate(p.flow_smoothing_rate, "physics.flow_smoothing_rate", &mut errors);
        check_fraction(p.downstream_vent_gain, "physics.downstream_vent_gain", &mut errors);
        check_non_negative(p.upstream_backpressure_gain, "physics.upstream_backpressure_gain", &mut errors);
        check_non_negative(p.default_target_pressure_psi, "physics.default_target_pressure_psi", &mut errors);
        check_non_negative(p.leak_loss_max_psi, "physics.leak_loss_max_psi", &mut errors);
        check_non_negative(p.flow_gain_active, "physics.flow_gain_active", &mut errors);
        check_non_negative(p.flow_gain_idle, "physics.flow_gain_idle", &mut errors);

        let l = &self.leak;
        check_non_negative(l.min_pressure_psi, "leak.min_pressure_psi", &mut errors);
        check_positive(l.base_intensity, "leak.base_intensity", &mut errors);
        check_non_negative(l.growth_rate, "leak.growth_rate", &mut errors);
        check_fraction(l.segment_fraction, "leak.segment_fraction", &mut errors);
        if !(l.max_intensity > 0.0 && l.max_intensity <= defaults::LEAK_MAX_INTENSITY) {
            errors.push(format!(
                "leak.max_intensity must be within (0, {:.0}] (got {})",
                defaults::LEAK_MAX_INTENSITY,
                l.max_intensity
            ));
        }
        if l.base_intensity > l.max_intensity {
            errors.push(format!(
                "leak.base_intensity ({:.1}) must be <= leak.max_intensity ({:.1})",
                l.base_intensity, l.max_intensity
            ));
        }
        if l.segment_id.trim().is_empty() {
            errors.push("leak.segment_id must not be empty".to_string());
        }

        let a = &self.acoustic;
        check_power_of_two(a.fft_size, "acoustic.fft_size", &mut errors);
        check_positive(a.sample_rate_hz, "acoustic.sample_rate_hz", &mut errors);
        let nyquist = a.sample_rate_hz / 2.0;
        for (freq, name) in [
            (a.carrier_frequency_hz, "acoustic.carrier_frequency_hz"),
            (a.base_tone_frequency_hz, "acoustic.base_tone_frequency_hz"),
            (a.leak_frequency_hz, "acoustic.leak_frequency_hz"),
        ] {
            if freq.is_finite() && nyquist.is_finite() && freq >= nyquist {
                errors.push(format!(
                    "{name} ({freq:.0} Hz) must be below the Nyquist frequency ({nyquist:.0} Hz)"
                ));
            }
        }

        let sp = &self.spectrum;
        if sp.display_bins == 0 {
            errors.push("spectrum.display_bins must be > 0".to_string());
        }
        check_rate(sp.smoothing_alpha, "spectrum.smoothing_alpha", &mut errors);

        let d = &self.detection;
        check_positive(d.confidence_span, "detection.confidence_span", &mut errors);
        check_rate(d.confidence_smoothing_rate, "detection.confidence_smoothing_rate", &mut errors);
        check_positive(d.ambient_noise_active, "detection.ambient_noise_active", &mut errors);
        check_positive(d.ambient_noise_idle, "detection.ambient_noise_idle", &mut errors);
        check_fraction(d.node_warning_confidence, "detection.node_warning_confidence", &mut errors);
        check_fraction(d.detected_confidence, "detection.detected_confidence", &mut errors);
        check_fraction(d.critical_confidence, "detection.critical_confidence", &mut errors);
        check_escalation(
            d.detected_confidence,
            d.critical_confidence,
            "detection.detected/critical_confidence",
            &mut errors,
        );

        let h = &self.hardware;
        check_power_of_two(h.buffer_size, "hardware.buffer_size", &mut errors);
        if h.display_bins == 0 {
            errors.push("hardware.display_bins must be > 0".to_string());
        }
        if h.poll_interval_ms == 0 {
            errors.push("hardware.poll_interval_ms must be > 0".to_string());
        }
        if h.request_timeout_ms == 0 {
            errors.push("hardware.request_timeout_ms must be > 0".to_string());
        }
        check_non_negative(h.jitter_v, "hardware.jitter_v", &mut errors);
        check_positive(h.sample_rate_hz, "hardware.sample_rate_hz", &mut errors);

        check_loop_rate(self.server.live_feed_hz, "server.live_feed_hz", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(format!("{name} must be a finite value > 0 (got {value})"));
    }
}

fn check_loop_rate(value: f64, name: &str, errors: &mut Vec<String>) {
    if !(value.is_finite() && value >= defaults::MIN_LOOP_RATE_HZ) {
        errors.push(format!(
            "{name} must be a finite value >= {} Hz (got {value})",
            defaults::MIN_LOOP_RATE_HZ
        ));
    }
}

fn check_non_negative(value: f64, name: &str, errors: &mut Vec<String>) {
    if !value.is_finite() || value < 0.0 {
        errors.push(format!("{name} must be a finite value >= 0 (got {value})"));
    }
}

fn check_fraction(value: f64, name: &str, errors: &mut Vec<String>) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(format!("{name} must be within [0, 1] (got {value})"));
    }
}

fn check_rate(value: f64, name: &str, errors: &mut Vec<String>) {
    // NaN fails both comparisons and lands here too
    if !(value > 0.0 && value <= 1.0) {
        errors.push(format!("{name} must be within (0, 1] (got {value})"));
    }
}

fn check_power_of_two(value: usize, name: &str, errors: &mut Vec<String>) {
    if value < 2 || !value.is_power_of_two() {
        errors.push(format!("{name} must be a power of two >= 2 (got {value})"));
    }
}

fn check_escalation(lower: f64, upper: f64, name: &str, errors: &mut Vec<String>) {
    if !lower.is_finite() || !upper.is_finite() {
        errors.push(format!(
            "{name}: values must be finite (got {lower}, {upper})"
        ));
        return;
    }
    if upper <= lower {
        errors.push(format!(
            "{name}: critical ({upper:.3}) must be > detected ({lower:.3})"
        ));
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            Self::Serialize(e) => write!(f, "Config serialization error: {}", e),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Site Info
// ============================================================================

/// Identification metadata. Not used for logic; appears in logs and the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Site / line identifier
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,
}

fn default_site_name() -> String {
    "DEFAULT".to_string()
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            description: String::new(),
        }
    }
}

// ============================================================================
// Simulation Loop
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Target tick rate (Hz)
    pub tick_rate_hz: f64,
    /// Largest `dt` integrated by one tick (seconds)
    pub max_tick_dt_secs: f64,
    /// Synthesizer RNG seed
    pub seed: u64,
    /// Start the tick loop at daemon startup
    pub autostart: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: defaults::TICK_RATE_HZ,
            max_tick_dt_secs: defaults::MAX_TICK_DT_SECS,
            seed: defaults::DEFAULT_SEED,
            autostart: true,
        }
    }
}

// ============================================================================
// Physics
// ============================================================================

/// Pressure/flow model constants. Smoothing rates are per 60 Hz reference tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub compressor_smoothing_rate: f64,
    pub system_pressure_smoothing_rate: f64,
    pub flow_smoothing_rate: f64,
    /// Compressor setpoint at startup (PSI)
    pub default_target_pressure_psi: f64,
    /// Upstream rise with the middle valve closed (fraction)
    pub upstream_backpressure_gain: f64,
    /// Point-2 vent with the outlet valve closed (fraction)
    pub downstream_vent_gain: f64,
    pub leak_loss_floor_psi: f64,
    pub leak_loss_per_intensity: f64,
    pub leak_loss_max_psi: f64,
    pub flow_gain_active: f64,
    pub flow_gain_idle: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            compressor_smoothing_rate: defaults::COMPRESSOR_SMOOTHING_RATE,
            system_pressure_smoothing_rate: defaults::SYSTEM_PRESSURE_SMOOTHING_RATE,
            flow_smoothing_rate: defaults::FLOW_SMOOTHING_RATE,
            default_target_pressure_psi: defaults::DEFAULT_TARGET_PRESSURE_PSI,
            upstream_backpressure_gain: defaults::UPSTREAM_BACKPRESSURE_GAIN,
            downstream_vent_gain: defaults::DOWNSTREAM_VENT_GAIN,
            leak_loss_floor_psi: defaults::LEAK_LOSS_FLOOR_PSI,
            leak_loss_per_intensity: defaults::LEAK_LOSS_PER_INTENSITY,
            leak_loss_max_psi: defaults::LEAK_LOSS_MAX_PSI,
            flow_gain_active: defaults::FLOW_GAIN_ACTIVE,
            flow_gain_idle: defaults::FLOW_GAIN_IDLE,
        }
    }
}

// ============================================================================
// Leak Lifecycle
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeakConfig {
    /// Compressor pressure a leak needs to exist (PSI)
    pub min_pressure_psi: f64,
    pub base_intensity: f64,
    /// Intensity units per second
    pub growth_rate: f64,
    pub max_intensity: f64,
    /// Segment the leak opens on
    pub segment_id: String,
    /// Position along the segment (0 = start, 1 = end)
    pub segment_fraction: f64,
}

impl Default for LeakConfig {
    fn default() -> Self {
        Self {
            min_pressure_psi: defaults::LEAK_MIN_PRESSURE_PSI,
            base_intensity: defaults::LEAK_BASE_INTENSITY,
            growth_rate: defaults::LEAK_GROWTH_RATE,
            max_intensity: defaults::LEAK_MAX_INTENSITY,
            segment_id: defaults::LEAK_SEGMENT_ID.to_string(),
            segment_fraction: defaults::LEAK_SEGMENT_FRACTION,
        }
    }
}

// ============================================================================
// Acoustic Synthesis
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcousticConfig {
    pub sample_rate_hz: f64,
    /// Buffer length, power of two
    pub fft_size: usize,
    pub carrier_frequency_hz: f64,
    pub carrier_amplitude: f64,
    pub base_tone_frequency_hz: f64,
    pub base_tone_amplitude: f64,
    pub noise_amplitude_active: f64,
    pub noise_amplitude_idle: f64,
    pub leak_frequency_hz: f64,
    /// Leak noise amplitude relative to the leak tone
    pub leak_noise_ratio: f64,
}

impl Default for AcousticConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::ACOUSTIC_SAMPLE_RATE_HZ,
            fft_size: defaults::ACOUSTIC_FFT_SIZE,
            carrier_frequency_hz: defaults::CARRIER_FREQUENCY_HZ,
            carrier_amplitude: defaults::CARRIER_AMPLITUDE,
            base_tone_frequency_hz: defaults::BASE_TONE_FREQUENCY_HZ,
            base_tone_amplitude: defaults::BASE_TONE_AMPLITUDE,
            noise_amplitude_active: defaults::NOISE_AMPLITUDE_ACTIVE,
            noise_amplitude_idle: defaults::NOISE_AMPLITUDE_IDLE,
            leak_frequency_hz: defaults::LEAK_FREQUENCY_HZ,
            leak_noise_ratio: defaults::LEAK_NOISE_RATIO,
        }
    }
}

// ============================================================================
// Spectrum Display
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    pub display_bins: usize,
    pub smoothing_alpha: f64,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            display_bins: defaults::DISPLAY_BINS,
            smoothing_alpha: defaults::SPECTRUM_SMOOTHING_ALPHA,
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub ambient_noise_active: f64,
    pub ambient_noise_idle: f64,
    pub confidence_span: f64,
    pub confidence_smoothing_rate: f64,
    pub node_warning_confidence: f64,
    pub detected_confidence: f64,
    pub critical_confidence: f64,
    pub system_confidence_ceiling: f64,
    pub system_confidence_slope: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            ambient_noise_active: defaults::AMBIENT_NOISE_ACTIVE,
            ambient_noise_idle: defaults::AMBIENT_NOISE_IDLE,
            confidence_span: defaults::CONFIDENCE_SPAN,
            confidence_smoothing_rate: defaults::CONFIDENCE_SMOOTHING_RATE,
            node_warning_confidence: defaults::NODE_WARNING_CONFIDENCE,
            detected_confidence: defaults::DETECTED_CONFIDENCE,
            critical_confidence: defaults::CRITICAL_CONFIDENCE,
            system_confidence_ceiling: defaults::SYSTEM_CONFIDENCE_CEILING,
            system_confidence_slope: defaults::SYSTEM_CONFIDENCE_SLOPE,
        }
    }
}

// ============================================================================
// Hardware Adapter
// ============================================================================

/// Real sensor endpoints. The adapter stays idle unless at least one URL is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub inlet_url: Option<String>,
    pub outlet_url: Option<String>,
    pub leak_url: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Circular buffer length, power of two
    pub buffer_size: usize,
    /// Peak jitter added to each appended sample (V)
    pub jitter_v: f64,
    pub display_bins: usize,
    /// Sample rate used to label hardware spectrum bins (Hz)
    pub sample_rate_hz: f64,
}

impl HardwareConfig {
    /// True when at least one source URL is configured.
    pub fn is_enabled(&self) -> bool {
        [&self.inlet_url, &self.outlet_url, &self.leak_url]
            .iter()
            .any(|u| u.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            inlet_url: None,
            outlet_url: None,
            leak_url: None,
            poll_interval_ms: defaults::HARDWARE_POLL_INTERVAL_MS,
            request_timeout_ms: defaults::HARDWARE_REQUEST_TIMEOUT_MS,
            buffer_size: defaults::HARDWARE_BUFFER_SIZE,
            jitter_v: defaults::HARDWARE_JITTER_V,
            display_bins: defaults::HARDWARE_DISPLAY_BINS,
            sample_rate_hz: 1000.0 / defaults::HARDWARE_POLL_INTERVAL_MS as f64,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `PNEUMAGUARD_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// WebSocket live feed rate (Hz)
    #[serde(default = "default_live_feed_hz")]
    pub live_feed_hz: f64,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

fn default_live_feed_hz() -> f64 {
    defaults::LIVE_FEED_HZ
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            live_feed_hz: default_live_feed_hz(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok(), "{:?}", config.validate());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = MonitorConfig::default();
        let text = config.to_toml().expect("serialize");
        let parsed = MonitorConfig::from_toml_str(&text).expect("parse");
        assert_eq!(parsed.acoustic.fft_size, config.acoustic.fft_size);
        assert_eq!(parsed.leak.segment_id, config.leak.segment_id);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MonitorConfig::from_toml_str(
            r#"
[physics]
flow_gain_active = 0.03
"#,
        )
        .expect("valid config");
        assert!((config.physics.flow_gain_active - 0.03).abs() < 1e-12);
        assert!((config.physics.compressor_smoothing_rate - 0.05).abs() < 1e-12);
        assert_eq!(config.spectrum.display_bins, 128);
    }

    #[test]
    fn test_validation_rejects_leak_ceiling_above_100() {
        let mut config = MonitorConfig::default();
        config.leak.max_intensity = 500.0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("leak.max_intensity")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        config.leak.max_intensity = 100.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_hardware_sample_rate() {
        let mut config = MonitorConfig::default();
        config.hardware.sample_rate_hz = 0.0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("hardware.sample_rate_hz")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_vanishing_loop_rates() {
        let mut config = MonitorConfig::default();
        config.simulation.tick_rate_hz = f64::MIN_POSITIVE / 4.0;
        config.server.live_feed_hz = 0.01;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("simulation.tick_rate_hz")));
                assert!(errors.iter().any(|e| e.contains("server.live_feed_hz")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        config.simulation.tick_rate_hz = 0.1;
        config.server.live_feed_hz = 0.1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_power_of_two_fft() {
        let mut config = MonitorConfig::default();
        config.acoustic.fft_size = 300;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("acoustic.fft_size")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_inverted_thresholds() {
        let mut config = MonitorConfig::default();
        config.detection.detected_confidence = 0.9;
        config.detection.critical_confidence = 0.5;
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_leak_above_nyquist() {
        let mut config = MonitorConfig::default();
        config.acoustic.leak_frequency_hz = 60_000.0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("Nyquist")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_nan_rate() {
        let mut config = MonitorConfig::default();
        config.physics.flow_smoothing_rate = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hardware_disabled_without_urls() {
        let mut hw = HardwareConfig::default();
        assert!(!hw.is_enabled());
        hw.leak_url = Some("  ".to_string());
        assert!(!hw.is_enabled());
        hw.leak_url = Some("http://10.0.0.7/leak".to_string());
        assert!(hw.is_enabled());
    }
}
