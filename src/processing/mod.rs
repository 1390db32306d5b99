//! Signal processing module - spectral analysis shared by the synthetic and
//! hardware signal paths.
//!
//! Everything here is stateless; callers carry the previous display bins.

mod binning;
mod fft;

pub use binning::*;
pub use fft::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in signal processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("Buffer length {len} is not a power of two >= 2")]
    NotPowerOfTwo { len: usize },

    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),
}

/// Features extracted from one magnitude spectrum.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SpectralFeatures {
    pub peak_bin: usize,
    pub peak_frequency_hz: f64,
    pub peak_magnitude: f64,
    /// Sum of squared magnitudes
    pub energy: f64,
}
