//! Config Validation Tests
//!
//! Exercises the two-pass config load (unknown-key warnings, then typed
//! validation) through real files on disk.

use std::io::Write;

use pneumaguard::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use pneumaguard::config::{ConfigError, MonitorConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// Unknown keys
// ============================================================================

#[test]
fn typo_in_leak_section_suggests_correction() {
    let toml_str = r#"
[leak]
growth_rat = 3.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].field.contains("growth_rat"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("leak.growth_rate"),
        "Should suggest the correct spelling"
    );
}

#[test]
fn unknown_section_is_reported() {
    let warnings = validate_unknown_keys("[turbine]\nspeed = 3\n");
    assert!(warnings.iter().any(|w| w.field.starts_with("turbine")));
}

#[test]
fn suggestion_requires_close_match() {
    let known = known_config_keys();
    assert!(suggest_correction("acoustic.zzzzzzzz", &known).is_none());
    assert_eq!(
        suggest_correction("server.live_feed_h", &known).as_deref(),
        Some("server.live_feed_hz")
    );
}

#[test]
fn typo_does_not_prevent_loading() {
    let file = write_config(
        r#"
[simulation]
tick_rate = 30.0
"#,
    );
    let config = MonitorConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.simulation.tick_rate_hz, 60.0);
}

// ============================================================================
// Typed validation
// ============================================================================

#[test]
fn partial_file_keeps_defaults() {
    let file = write_config(
        r#"
[site]
name = "Bench B"

[physics]
default_target_pressure_psi = 80.0
"#,
    );
    let config = MonitorConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.site.name, "Bench B");
    assert_eq!(config.physics.default_target_pressure_psi, 80.0);
    assert_eq!(config.acoustic.fft_size, 1024);
    assert_eq!(config.spectrum.display_bins, 128);
}

#[test]
fn non_power_of_two_fft_size_is_rejected() {
    let file = write_config("[acoustic]\nfft_size = 300\n");
    match MonitorConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(problems)) => {
            assert!(problems.iter().any(|p| p.contains("fft_size")), "{problems:?}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn inverted_thresholds_and_bad_rates_are_all_reported() {
    let file = write_config(
        r#"
[detection]
detected_confidence = 0.9
critical_confidence = 0.5
confidence_smoothing_rate = 1.5
"#,
    );
    match MonitorConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(problems)) => {
            assert!(problems.len() >= 2, "{problems:?}");
            assert!(problems.iter().any(|p| p.contains("critical_confidence")));
            assert!(problems.iter().any(|p| p.contains("confidence_smoothing_rate")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn leak_ceiling_above_100_is_rejected() {
    let file = write_config("[leak]\nmax_intensity = 500.0\n");
    match MonitorConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(problems)) => {
            assert!(problems.iter().any(|p| p.contains("leak.max_intensity")), "{problems:?}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn zero_hardware_sample_rate_is_rejected() {
    let file = write_config("[hardware]\nsample_rate_hz = 0.0\n");
    assert!(matches!(
        MonitorConfig::load_from_file(file.path()),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_config("[simulation\ntick_rate_hz = ");
    assert!(matches!(
        MonitorConfig::load_from_file(file.path()),
        Err(ConfigError::Parse(..))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(MonitorConfig::load_from_file(&path), Err(ConfigError::Io(..))));
}

#[test]
fn default_config_round_trips_through_toml() {
    let toml_str = MonitorConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&toml_str).is_empty());
    let file = write_config(&toml_str);
    let loaded = MonitorConfig::load_from_file(file.path()).unwrap();
    assert_eq!(loaded.acoustic.sample_rate_hz, 96_000.0);
    assert_eq!(loaded.leak.segment_id, "branch");
}

// ============================================================================
// Physical ranges
// ============================================================================

#[test]
fn defaults_raise_no_range_warnings() {
    assert!(validate_physical_ranges(&MonitorConfig::default()).is_empty());
}

#[test]
fn unusual_target_pressure_warns_but_loads() {
    let file = write_config("[physics]\ndefault_target_pressure_psi = 400.0\n");
    let config = MonitorConfig::load_from_file(file.path()).unwrap();
    let warnings = validate_physical_ranges(&config);
    assert!(warnings
        .iter()
        .any(|w| w.field.contains("default_target_pressure_psi")));
}
