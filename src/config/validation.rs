//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `MonitorConfig`.
///
/// Maintained by hand to match the struct hierarchy in `monitor_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [site]
        "site",
        "site.name",
        "site.description",
        // [simulation]
        "simulation",
        "simulation.tick_rate_hz",
        "simulation.max_tick_dt_secs",
        "simulation.seed",
        "simulation.autostart",
        // [physics]
        "physics",
        "physics.compressor_smoothing_rate",
        "physics.system_pressure_smoothing_rate",
        "physics.flow_smoothing_rate",
        "physics.default_target_pressure_psi",
        "physics.upstream_backpressure_gain",
        "physics.downstream_vent_gain",
        "physics.leak_loss_floor_psi",
        "physics.leak_loss_per_intensity",
        "physics.leak_loss_max_psi",
        "physics.flow_gain_active",
        "physics.flow_gain_idle",
        // [leak]
        "leak",
        "leak.min_pressure_psi",
        "leak.base_intensity",
        "leak.growth_rate",
        "leak.max_intensity",
        "leak.segment_id",
        "leak.segment_fraction",
        // [acoustic]
        "acoustic",
        "acoustic.sample_rate_hz",
        "acoustic.fft_size",
        "acoustic.carrier_frequency_hz",
        "acoustic.carrier_amplitude",
        "acoustic.base_tone_frequency_hz",
        "acoustic.base_tone_amplitude",
        "acoustic.noise_amplitude_active",
        "acoustic.noise_amplitude_idle",
        "acoustic.leak_frequency_hz",
        "acoustic.leak_noise_ratio",
        // [spectrum]
        "spectrum",
        "spectrum.display_bins",
        "spectrum.smoothing_alpha",
        // [detection]
        "detection",
        "detection.ambient_noise_active",
        "detection.ambient_noise_idle",
        "detection.confidence_span",
        "detection.confidence_smoothing_rate",
        "detection.node_warning_confidence",
        "detection.detected_confidence",
        "detection.critical_confidence",
        "detection.system_confidence_ceiling",
        "detection.system_confidence_slope",
        // [hardware]
        "hardware",
        "hardware.inlet_url",
        "hardware.outlet_url",
        "hardware.leak_url",
        "hardware.poll_interval_ms",
        "hardware.request_timeout_ms",
        "hardware.buffer_size",
        "hardware.jitter_v",
        "hardware.display_bins",
        "hardware.sample_rate_hz",
        // [server]
        "server",
        "server.addr",
        "server.live_feed_hz",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        // tie-break on the key so the suggestion doesn't depend on hash order
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails: a document that does not parse yields no warnings and is
/// reported by the typed deserialization pass instead.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    let mut found = walk_toml_keys(&value, "");
    found.sort();

    found
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            ValidationWarning {
                field: key,
                message,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Plausibility Checks
// ============================================================================

/// Flag values that are legal but unlikely to be intended.
///
/// Hard errors live in [`MonitorConfig::validate`](super::MonitorConfig::validate);
/// these only produce warnings.
pub fn validate_physical_ranges(config: &super::MonitorConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let target = config.physics.default_target_pressure_psi;
    if target > 250.0 {
        warnings.push(ValidationWarning {
            field: "physics.default_target_pressure_psi".to_string(),
            message: format!(
                "default_target_pressure_psi = {target:.1} is above typical shop-air range (0-250 psi)"
            ),
            suggestion: None,
        });
    }

    let leak = &config.leak;
    if leak.min_pressure_psi >= target && target > 0.0 {
        warnings.push(ValidationWarning {
            field: "leak.min_pressure_psi".to_string(),
            message: format!(
                "leak.min_pressure_psi = {:.1} is not below the default target ({target:.1}), leaks will never open",
                leak.min_pressure_psi
            ),
            suggestion: None,
        });
    }

    let h = &config.hardware;
    if h.request_timeout_ms > h.poll_interval_ms.saturating_mul(5) {
        warnings.push(ValidationWarning {
            field: "hardware.request_timeout_ms".to_string(),
            message: format!(
                "request_timeout_ms = {} is far above poll_interval_ms = {}, polls will back up",
                h.request_timeout_ms, h.poll_interval_ms
            ),
            suggestion: None,
        });
    }
    if h.jitter_v > 0.1 {
        warnings.push(ValidationWarning {
            field: "hardware.jitter_v".to_string(),
            message: format!("jitter_v = {:.4} V will mask real sensor signal", h.jitter_v),
            suggestion: None,
        });
    }

    if config.server.live_feed_hz > config.simulation.tick_rate_hz {
        warnings.push(ValidationWarning {
            field: "server.live_feed_hz".to_string(),
            message: format!(
                "live_feed_hz = {:.1} exceeds tick_rate_hz = {:.1}, frames will repeat",
                config.server.live_feed_hz, config.simulation.tick_rate_hz
            ),
            suggestion: None,
        });
    }

    warnings
}

// ============================================================================
// Tests
// ============================================================================
