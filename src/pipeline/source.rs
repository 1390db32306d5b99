//! Signal source abstraction and the shared spectral chain.
//!
//! The synthetic acoustic frame and the hardware leak-voltage buffer both
//! implement [`SignalSource`]; [`SpectralPipeline`] turns either into a
//! magnitude spectrum, its features and the next smoothed display bins.

use tracing::trace;

use crate::processing::{
    analyze_spectrum, compute_magnitude_spectrum, downsample, smooth_spectrum, ProcessingError,
    SpectralFeatures,
};

/// A fixed-length, power-of-two sample buffer at a known rate.
pub trait SignalSource {
    /// Human-readable name for logging (e.g. "synthetic", "hardware").
    fn source_name(&self) -> &str;

    /// Samples per second.
    fn sample_rate(&self) -> f64;

    /// Time-ordered samples, oldest first.
    fn buffer(&self) -> &[f64];
}

/// Output of one pass through the spectral chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumResult {
    /// Full-resolution magnitudes (`N/2` bins)
    pub magnitudes: Vec<f64>,
    /// Next smoothed display bins
    pub display: Vec<f64>,
    pub features: SpectralFeatures,
}

/// FFT → feature extraction → downsample → smooth.
#[derive(Debug, Clone, Copy)]
pub struct SpectralPipeline {
    display_bins: usize,
    alpha: f64,
}

impl SpectralPipeline {
    pub const fn new(display_bins: usize, alpha: f64) -> Self {
        Self { display_bins, alpha }
    }

    pub const fn display_bins(&self) -> usize {
        self.display_bins
    }

    /// Run `source` through the chain, smoothing against `prev_display`.
    pub fn process(
        &self,
        source: &dyn SignalSource,
        prev_display: &[f64],
    ) -> Result<SpectrumResult, ProcessingError> {
        let sample_rate = source.sample_rate();
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ProcessingError::InvalidSamplingRate(sample_rate));
        }

        let buffer = source.buffer();
        let magnitudes = compute_magnitude_spectrum(buffer)?;
        let features = analyze_spectrum(&magnitudes, buffer.len(), sample_rate);
        let target = downsample(&magnitudes, self.display_bins);
        let display = smooth_spectrum(prev_display, &target, self.alpha);

        trace!(
            source = source.source_name(),
            peak_hz = features.peak_frequency_hz,
            energy = features.energy,
            "Spectrum processed"
        );

        Ok(SpectrumResult {
            magnitudes,
            display,
            features,
        })
    }
}
