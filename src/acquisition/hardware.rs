//! Hardware telemetry adapter.
//!
//! Each configured source (inlet, outlet, leak) is an HTTP GET endpoint
//! returning `{ "pressure_bar": f64?, "voltage": f64, "leak": bool? }`.
//! All sources are polled concurrently; one failure fails the whole cycle,
//! which keeps the last complete reading and only flips `connected` off.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::prelude::*;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::defaults::PSI_PER_BAR;
use crate::config::HardwareConfig;
use crate::pipeline::{PeriodicJob, SharedState, SignalSource, SpectralPipeline};
use crate::types::{HardwareSnapshot, HardwareTelemetry};

/// Hardware polling errors
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("HTTP error from {source_name} source: {error}")]
    Http {
        source_name: &'static str,
        #[source]
        error: reqwest::Error,
    },

    #[error("{source_name} source returned status {status}")]
    Status {
        source_name: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{source_name} source reported a non-finite value")]
    InvalidReading { source_name: &'static str },
}

/// Body returned by one source.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct SourceReading {
    #[serde(default, alias = "pressure")]
    pub pressure_bar: Option<f64>,
    #[serde(alias = "v")]
    pub voltage: f64,
    #[serde(default, alias = "leak_detected")]
    pub leak: Option<bool>,
}

impl SourceReading {
    fn is_finite(&self) -> bool {
        self.voltage.is_finite() && self.pressure_bar.map_or(true, f64::is_finite)
    }

    fn pressure_psi(&self) -> Option<f64> {
        self.pressure_bar.map(|bar| bar * PSI_PER_BAR)
    }
}

/// One complete poll cycle. A `None` source is not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HardwareReading {
    pub inlet: Option<SourceReading>,
    pub outlet: Option<SourceReading>,
    pub leak: Option<SourceReading>,
}

impl HardwareReading {
    /// Telemetry record for a successful cycle completed at `now_ms`.
    pub fn to_telemetry(&self, now_ms: i64) -> HardwareTelemetry {
        let inlet_psi = self.inlet.and_then(|r| r.pressure_psi());
        let outlet_psi = self.outlet.and_then(|r| r.pressure_psi());
        let system_psi = match (inlet_psi, outlet_psi) {
            (Some(a), Some(b)) => (a + b) / 2.0,
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => 0.0,
        };

        HardwareTelemetry {
            inlet_pressure_psi: inlet_psi.unwrap_or(0.0),
            outlet_pressure_psi: outlet_psi.unwrap_or(0.0),
            system_pressure_psi: system_psi,
            inlet_voltage: self.inlet.map_or(0.0, |r| r.voltage),
            outlet_voltage: self.outlet.map_or(0.0, |r| r.voltage),
            leak_voltage: self.leak.map_or(0.0, |r| r.voltage),
            leak_detected: self.leak.and_then(|r| r.leak).unwrap_or(false),
            connected: true,
            last_update: now_ms,
        }
    }
}

/// Telemetry after a failed cycle: last complete values, disconnected.
pub fn mark_disconnected(prev: &HardwareTelemetry) -> HardwareTelemetry {
    HardwareTelemetry {
        connected: false,
        ..*prev
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

#[derive(Clone)]
pub struct HardwareClient {
    http: reqwest::Client,
    inlet_url: Option<String>,
    outlet_url: Option<String>,
    leak_url: Option<String>,
}

impl HardwareClient {
    pub fn new(config: &HardwareConfig) -> Result<Self, HardwareError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let clean = |url: &Option<String>| {
            url.as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            http,
            inlet_url: clean(&config.inlet_url),
            outlet_url: clean(&config.outlet_url),
            leak_url: clean(&config.leak_url),
        })
    }

    pub fn has_leak_source(&self) -> bool {
        self.leak_url.is_some()
    }

    async fn fetch(
        &self,
        source_name: &'static str,
        url: Option<&str>,
    ) -> Result<Option<SourceReading>, HardwareError> {
        let Some(url) = url else {
            return Ok(None);
        };

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| HardwareError::Http { source_name, error })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HardwareError::Status { source_name, status });
        }

        let reading: SourceReading = resp
            .json()
            .await
            .map_err(|error| HardwareError::Http { source_name, error })?;

        if !reading.is_finite() {
            return Err(HardwareError::InvalidReading { source_name });
        }
        Ok(Some(reading))
    }

    /// Poll every configured source concurrently.
    pub async fn poll(&self) -> Result<HardwareReading, HardwareError> {
        let (inlet, outlet, leak) = tokio::try_join!(
            self.fetch("inlet", self.inlet_url.as_deref()),
            self.fetch("outlet", self.outlet_url.as_deref()),
            self.fetch("leak", self.leak_url.as_deref()),
        )?;
        Ok(HardwareReading { inlet, outlet, leak })
    }
}

// ============================================================================
// Signal Buffer
// ============================================================================

/// Fixed-length leak-voltage history, shifted left on every append.
#[derive(Debug, Clone)]
pub struct HardwareSignalBuffer {
    samples: Vec<f64>,
    sample_rate: f64,
    appended: usize,
}

impl HardwareSignalBuffer {
    pub fn new(capacity: usize, sample_rate: f64) -> Self {
        Self {
            samples: vec![0.0; capacity],
            sample_rate,
            appended: 0,
        }
    }

    pub fn push(&mut self, sample: f64) {
        if self.samples.is_empty() {
            return;
        }
        self.samples.copy_within(1.., 0);
        if let Some(last) = self.samples.last_mut() {
            *last = sample;
        }
        self.appended = self.appended.saturating_add(1);
    }

    /// Real samples held, at most the capacity.
    pub fn filled(&self) -> usize {
        self.appended.min(self.samples.len())
    }
}

impl SignalSource for HardwareSignalBuffer {
    fn source_name(&self) -> &str {
        "hardware"
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn buffer(&self) -> &[f64] {
        &self.samples
    }
}

// ============================================================================
// Poll Job
// ============================================================================

/// Polls the sources once per period and publishes a [`HardwareSnapshot`].
pub struct HardwarePollJob {
    client: HardwareClient,
    buffer: HardwareSignalBuffer,
    spectral: SpectralPipeline,
    jitter_v: f64,
    rng: StdRng,
    shared: Arc<SharedState>,
    period: Duration,
}

impl HardwarePollJob {
    pub fn new(
        config: &HardwareConfig,
        smoothing_alpha: f64,
        shared: Arc<SharedState>,
    ) -> Result<Self, HardwareError> {
        Ok(Self {
            client: HardwareClient::new(config)?,
            buffer: HardwareSignalBuffer::new(config.buffer_size, config.sample_rate_hz),
            spectral: SpectralPipeline::new(config.display_bins, smoothing_alpha),
            jitter_v: config.jitter_v.abs(),
            rng: StdRng::from_entropy(),
            shared,
            period: Duration::from_millis(config.poll_interval_ms),
        })
    }

    /// Fixed RNG seed for the sample jitter.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn buffer(&self) -> &HardwareSignalBuffer {
        &self.buffer
    }

    /// Run one poll cycle and publish the result.
    pub async fn poll_once(&mut self) -> anyhow::Result<()> {
        let prev = self.shared.hardware();

        let next = match self.client.poll().await {
            Ok(reading) => {
                if !prev.telemetry.connected {
                    info!("Hardware sources connected");
                }
                let telemetry = reading.to_telemetry(chrono::Utc::now().timestamp_millis());

                let spectrum = if self.client.has_leak_source() {
                    let jitter = self.rng.gen_range(-self.jitter_v..=self.jitter_v);
                    self.buffer.push(telemetry.leak_voltage + jitter);
                    match self.spectral.process(&self.buffer, &prev.spectrum) {
                        Ok(result) => result.display,
                        Err(e) => {
                            warn!(error = %e, "Hardware spectrum failed, keeping previous bins");
                            prev.spectrum.clone()
                        }
                    }
                } else {
                    prev.spectrum.clone()
                };

                HardwareSnapshot {
                    enabled: true,
                    telemetry,
                    spectrum,
                    samples_buffered: self.buffer.filled(),
                }
            }
            Err(e) => {
                if prev.telemetry.connected {
                    warn!(error = %e, "Hardware poll failed, marking disconnected");
                } else {
                    debug!(error = %e, "Hardware poll failed");
                }
                HardwareSnapshot {
                    enabled: true,
                    telemetry: mark_disconnected(&prev.telemetry),
                    spectrum: prev.spectrum.clone(),
                    samples_buffered: self.buffer.filled(),
                }
            }
        };

        self.shared.publish_hardware(next);
        Ok(())
    }
}

#[async_trait]
impl PeriodicJob for HardwarePollJob {
    fn name(&self) -> &str {
        "hardware"
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run_once(&mut self, _elapsed: Duration) -> anyhow::Result<()> {
        self.poll_once().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(bar: Option<f64>, voltage: f64, leak: Option<bool>) -> SourceReading {
        SourceReading { pressure_bar: bar, voltage, leak }
    }

    #[test]
    fn test_source_reading_aliases() {
        let r: SourceReading = serde_json::from_str(r#"{"pressure": 2.0, "v": 1.5}"#).unwrap();
        assert_eq!(r, reading(Some(2.0), 1.5, None));
        let r: SourceReading =
            serde_json::from_str(r#"{"voltage": 0.3, "leak_detected": true}"#).unwrap();
        assert_eq!(r.leak, Some(true));
        assert!(r.pressure_bar.is_none());
    }

    #[test]
    fn test_to_telemetry_converts_and_averages() {
        let cycle = HardwareReading {
            inlet: Some(reading(Some(2.0), 1.0, None)),
            outlet: Some(reading(Some(1.0), 0.5, None)),
            leak: Some(reading(None, 0.25, Some(true))),
        };
        let t = cycle.to_telemetry(1234);
        assert!((t.inlet_pressure_psi - 29.0076).abs() < 1e-9);
        assert!((t.outlet_pressure_psi - 14.5038).abs() < 1e-9);
        assert!((t.system_pressure_psi - 21.7557).abs() < 1e-9);
        assert_eq!(t.leak_voltage, 0.25);
        assert!(t.leak_detected);
        assert!(t.connected);
        assert_eq!(t.last_update, 1234);
    }

    #[test]
    fn test_mark_disconnected_keeps_values() {
        let t = HardwareReading {
            inlet: Some(reading(Some(2.0), 1.0, None)),
            ..HardwareReading::default()
        }
        .to_telemetry(99);
        let d = mark_disconnected(&t);
        assert!(!d.connected);
        assert_eq!(d.last_update, 99);
        assert_eq!(d.inlet_pressure_psi, t.inlet_pressure_psi);
    }

    #[test]
    fn test_buffer_shifts_and_appends() {
        let mut buf = HardwareSignalBuffer::new(4, 5.0);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            buf.push(v);
        }
        assert_eq!(buf.buffer(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(buf.filled(), 4);
    }
}
