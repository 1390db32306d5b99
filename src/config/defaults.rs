//! System-wide default constants.
//!
//! Centralises the magic numbers of the physical model, the acoustic chain
//! and the runtime loops. Grouped by subsystem for easy discovery. Every value
//! here is the default of a field in [`MonitorConfig`](super::MonitorConfig).

// ============================================================================
// Simulation Loop
// ============================================================================

/// Physics/acoustic tick rate (Hz). All per-tick smoothing rates are defined
/// against this reference cadence.
pub const TICK_RATE_HZ: f64 = 60.0;

/// Largest elapsed time a single tick may integrate (seconds).
///
/// A loop that stalls for longer is treated as if it had run one long tick.
pub const MAX_TICK_DT_SECS: f64 = 0.25;

/// Slowest cadence accepted for the tick loop and the live feed (Hz).
pub const MIN_LOOP_RATE_HZ: f64 = 0.1;

/// Default RNG seed for the acoustic synthesizer.
pub const DEFAULT_SEED: u64 = 0x5EED_AC05;

// ============================================================================
// Pressure / Flow Model
// ============================================================================

/// Compressor output smoothing rate per reference tick.
pub const COMPRESSOR_SMOOTHING_RATE: f64 = 0.05;

/// System pressure smoothing rate per reference tick.
pub const SYSTEM_PRESSURE_SMOOTHING_RATE: f64 = 0.1;

/// Flow velocity smoothing rate per reference tick.
pub const FLOW_SMOOTHING_RATE: f64 = 0.1;

/// Default compressor setpoint (PSI).
pub const DEFAULT_TARGET_PRESSURE_PSI: f64 = 100.0;

/// Fractional upstream pressure rise when the middle valve is fully closed.
pub const UPSTREAM_BACKPRESSURE_GAIN: f64 = 0.1;

/// Fraction of point-2 pressure vented when the outlet valve is fully closed.
pub const DOWNSTREAM_VENT_GAIN: f64 = 1.0;

/// Point-2 pressure (PSI) above which an active leak bleeds pressure.
pub const LEAK_LOSS_FLOOR_PSI: f64 = 5.0;

/// Pressure loss per unit of leak intensity (PSI).
pub const LEAK_LOSS_PER_INTENSITY: f64 = 0.2;

/// Upper bound on the leak pressure loss (PSI).
pub const LEAK_LOSS_MAX_PSI: f64 = 20.0;

/// Flow velocity per PSI at fully open valves, compressor running (m/s/PSI).
pub const FLOW_GAIN_ACTIVE: f64 = 0.02;

/// Flow velocity per PSI at fully open valves, compressor idle (m/s/PSI).
pub const FLOW_GAIN_IDLE: f64 = 0.005;

// ============================================================================
// Leak Lifecycle
// ============================================================================

/// Compressor pressure (PSI) a leak needs to exist.
pub const LEAK_MIN_PRESSURE_PSI: f64 = 5.0;

/// Intensity of a freshly created leak.
pub const LEAK_BASE_INTENSITY: f64 = 5.0;

/// Leak intensity growth (units per second).
pub const LEAK_GROWTH_RATE: f64 = 2.0;

/// Leak intensity ceiling.
pub const LEAK_MAX_INTENSITY: f64 = 100.0;

/// Segment a simulated leak opens on.
pub const LEAK_SEGMENT_ID: &str = "branch";

/// Position of the leak along its segment (0 = start, 1 = end).
pub const LEAK_SEGMENT_FRACTION: f64 = 0.5;

// ============================================================================
// Acoustic Synthesis
// ============================================================================

/// Synthetic ultrasonic sample rate (Hz).
pub const ACOUSTIC_SAMPLE_RATE_HZ: f64 = 96_000.0;

/// Synthetic buffer length (samples). Must be a power of two.
pub const ACOUSTIC_FFT_SIZE: usize = 1024;

/// Compressor motor carrier frequency (Hz).
pub const CARRIER_FREQUENCY_HZ: f64 = 120.0;

/// Compressor carrier amplitude.
pub const CARRIER_AMPLITUDE: f64 = 2.0;

/// Compressor "base" tone frequency (Hz).
pub const BASE_TONE_FREQUENCY_HZ: f64 = 4_500.0;

/// Compressor base tone amplitude.
pub const BASE_TONE_AMPLITUDE: f64 = 1.0;

/// Broadband noise amplitude while the compressor runs.
pub const NOISE_AMPLITUDE_ACTIVE: f64 = 0.5;

/// Broadband noise amplitude while the compressor is idle.
pub const NOISE_AMPLITUDE_IDLE: f64 = 0.1;

/// Characteristic leak hiss frequency (Hz).
pub const LEAK_FREQUENCY_HZ: f64 = 40_000.0;

/// Leak noise amplitude relative to the leak tone amplitude.
pub const LEAK_NOISE_RATIO: f64 = 0.25;

// ============================================================================
// Spectrum Display
// ============================================================================

/// Display resolution of the smoothed spectrum (bins).
pub const DISPLAY_BINS: usize = 128;

/// Exponential smoothing factor of the displayed spectrum.
pub const SPECTRUM_SMOOTHING_ALPHA: f64 = 0.25;

// ============================================================================
// Detection
// ============================================================================

/// Ambient ultrasonic level while the compressor runs.
pub const AMBIENT_NOISE_ACTIVE: f64 = 20.0;

/// Ambient ultrasonic level while the compressor is idle.
pub const AMBIENT_NOISE_IDLE: f64 = 5.0;

/// Signal excess over ambient that maps to full raw confidence.
pub const CONFIDENCE_SPAN: f64 = 40.0;

/// Node confidence smoothing rate per reference tick.
pub const CONFIDENCE_SMOOTHING_RATE: f64 = 0.1;

/// Smoothed confidence above which an ultrasonic node reports WARNING.
pub const NODE_WARNING_CONFIDENCE: f64 = 0.6;

/// Max confidence above which the system reports DETECTED.
pub const DETECTED_CONFIDENCE: f64 = 0.4;

/// Max confidence above which the system reports CRITICAL.
pub const CRITICAL_CONFIDENCE: f64 = 0.8;

/// `system_confidence = CEILING - SLOPE * max_confidence`.
pub const SYSTEM_CONFIDENCE_CEILING: f64 = 0.99;

/// See [`SYSTEM_CONFIDENCE_CEILING`].
pub const SYSTEM_CONFIDENCE_SLOPE: f64 = 0.3;

// ============================================================================
// Hardware Adapter
// ============================================================================

/// 1 bar in PSI.
pub const PSI_PER_BAR: f64 = 14.5038;

/// Hardware poll cadence (ms).
pub const HARDWARE_POLL_INTERVAL_MS: u64 = 200;

/// Per-request timeout for each hardware source (ms).
pub const HARDWARE_REQUEST_TIMEOUT_MS: u64 = 500;

/// Hardware circular buffer length (samples). Must be a power of two.
pub const HARDWARE_BUFFER_SIZE: usize = 256;

/// Peak amplitude of the jitter added to every hardware sample (V).
pub const HARDWARE_JITTER_V: f64 = 0.001;

/// Display resolution of the hardware spectrum (bins).
pub const HARDWARE_DISPLAY_BINS: usize = 64;

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Snapshot rate of the WebSocket live feed (Hz).
pub const LIVE_FEED_HZ: f64 = 10.0;
