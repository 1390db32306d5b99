//! Radix-2 decimation-in-time FFT on real buffers.
//!
//! Output is the one-sided magnitude spectrum scaled by `2/N`, so a sine of
//! amplitude `A` centred on a bin reads `A`.

use std::f64::consts::PI;

use super::{ProcessingError, SpectralFeatures};

/// Magnitude spectrum of a real power-of-two buffer.
///
/// Returns `N/2` bins; bin `i` covers `i · sample_rate / N` Hz. Reentrant, no
/// hidden state.
pub fn compute_magnitude_spectrum(buffer: &[f64]) -> Result<Vec<f64>, ProcessingError> {
    let n = buffer.len();
    if n < 2 || !n.is_power_of_two() {
        return Err(ProcessingError::NotPowerOfTwo { len: n });
    }

    let mut re = buffer.to_vec();
    let mut im = vec![0.0; n];

    // bit-reversal permutation
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if i < j {
            re.swap(i, j);
        }
    }

    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let theta = -2.0 * PI / size as f64;
        for start in (0..n).step_by(size) {
            for k in 0..half {
                let (sin, cos) = (theta * k as f64).sin_cos();
                let a = start + k;
                let b = a + half;
                let tr = re[b] * cos - im[b] * sin;
                let ti = re[b] * sin + im[b] * cos;
                re[b] = re[a] - tr;
                im[b] = im[a] - ti;
                re[a] += tr;
                im[a] += ti;
            }
        }
        size <<= 1;
    }

    let scale = 2.0 / n as f64;
    Ok((0..n / 2)
        .map(|i| re[i].hypot(im[i]) * scale)
        .collect())
}

/// Centre frequency of `bin` for an FFT of `fft_size` samples.
#[inline]
pub fn bin_frequency(bin: usize, fft_size: usize, sample_rate: f64) -> f64 {
    if fft_size == 0 {
        return 0.0;
    }
    bin as f64 * sample_rate / fft_size as f64
}

/// Sum of squared magnitudes. Non-finite bins contribute nothing.
pub fn spectral_energy(magnitudes: &[f64]) -> f64 {
    magnitudes
        .iter()
        .filter(|m| m.is_finite())
        .map(|m| m * m)
        .sum()
}

/// Strongest non-DC bin, if any bin above DC exists.
pub fn find_peak_bin(magnitudes: &[f64]) -> Option<(usize, f64)> {
    magnitudes
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, m)| m.is_finite())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, &m)| (i, m))
}

/// Peak and energy of a magnitude spectrum computed from `fft_size` samples.
pub fn analyze_spectrum(magnitudes: &[f64], fft_size: usize, sample_rate: f64) -> SpectralFeatures {
    let (peak_bin, peak_magnitude) = find_peak_bin(magnitudes).unwrap_or((0, 0.0));
    SpectralFeatures {
        peak_bin,
        peak_frequency_hz: bin_frequency(peak_bin, fft_size, sample_rate),
        peak_magnitude,
        energy: spectral_energy(magnitudes),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, amp: f64, sr: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * PI * freq * i as f64 / sr).sin())
            .collect()
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        for len in [0, 1, 3, 300, 1000] {
            let err = compute_magnitude_spectrum(&vec![0.0; len]).unwrap_err();
            assert_eq!(err, ProcessingError::NotPowerOfTwo { len });
        }
    }

    #[test]
    fn test_output_is_half_length() {
        let out = compute_magnitude_spectrum(&[1.0; 64]).unwrap();
        assert_eq!(out.len(), 32);
    }

    #[test]
    fn test_on_bin_sine_reads_its_amplitude() {
        let n = 1024;
        let sr = 96_000.0;
        let bin = 427;
        let freq = bin as f64 * sr / n as f64;
        let mags = compute_magnitude_spectrum(&sine(freq, 3.0, sr, n)).unwrap();
        let (peak, mag) = find_peak_bin(&mags).unwrap();
        assert_eq!(peak, bin);
        assert!((mag - 3.0).abs() < 1e-6, "magnitude {mag}");
    }

    #[test]
    fn test_off_bin_sine_peaks_at_nearest_bin() {
        let n = 1024;
        let sr = 96_000.0;
        let freq = 40_000.0;
        let mags = compute_magnitude_spectrum(&sine(freq, 1.0, sr, n)).unwrap();
        let (peak, mag) = find_peak_bin(&mags).unwrap();
        let expected = (freq * n as f64 / sr).round() as usize;
        assert!(peak.abs_diff(expected) <= 1);
        // scalloping loss is bounded for a rectangular window
        assert!(mag > 0.6 && mag <= 1.0 + 1e-9, "magnitude {mag}");
    }

    #[test]
    fn test_reentrant() {
        let signal = sine(1000.0, 1.0, 8000.0, 256);
        let a = compute_magnitude_spectrum(&signal).unwrap();
        let b = compute_magnitude_spectrum(&signal).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_analyze_spectrum() {
        let n = 256;
        let sr = 1000.0;
        let freq = bin_frequency(32, n, sr);
        let mags = compute_magnitude_spectrum(&sine(freq, 2.0, sr, n)).unwrap();
        let features = analyze_spectrum(&mags, n, sr);
        assert_eq!(features.peak_bin, 32);
        assert!((features.peak_frequency_hz - 125.0).abs() < 1e-9);
        assert!((features.energy - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_peak_ignores_dc_and_nan() {
        let mags = [10.0, 1.0, f64::NAN, 3.0];
        assert_eq!(find_peak_bin(&mags), Some((3, 3.0)));
        assert_eq!(find_peak_bin(&[5.0]), None);
    }
}
