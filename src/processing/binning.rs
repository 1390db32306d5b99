//! Display binning and exponential smoothing of magnitude spectra.

use tracing::trace;

/// Average `source` down (or up) to `bins` values.
///
/// Output bin `i` averages `source[i·len/bins .. (i+1)·len/bins]`, always
/// using at least one source element. Non-finite inputs count as zero.
pub fn downsample(source: &[f64], bins: usize) -> Vec<f64> {
    let len = source.len();
    if len == 0 {
        return vec![0.0; bins];
    }

    (0..bins)
        .map(|i| {
            let start = (i * len / bins).min(len - 1);
            let end = ((i + 1) * len / bins).clamp(start + 1, len);
            let sum: f64 = source[start..end].iter().map(|&v| finite_or_zero(v)).sum();
            finite_or_zero(sum / (end - start) as f64)
        })
        .collect()
}

/// One smoothing step: `prev[i] += (target[i] − prev[i]) · alpha`.
///
/// A `prev` of the wrong length restarts from zero; non-finite targets are
/// zeroed first.
pub fn smooth_spectrum(prev: &[f64], target: &[f64], alpha: f64) -> Vec<f64> {
    if prev.len() != target.len() {
        trace!(prev = prev.len(), target = target.len(), "Spectrum length changed, restarting smoothing");
    }
    target
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let p = prev.get(i).copied().map_or(0.0, finite_or_zero);
            p + (finite_or_zero(t) - p) * alpha
        })
        .collect()
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_way_average() {
        let source: Vec<f64> = (0..512).map(|i| (i / 4) as f64).collect();
        let out = downsample(&source, 128);
        assert_eq!(out.len(), 128);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[127], 127.0);
    }

    #[test]
    fn test_uneven_ratio_covers_whole_source() {
        let source = vec![1.0; 100];
        let out = downsample(&source, 64);
        assert!(out.iter().all(|&v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_upsampling_repeats_elements() {
        let out = downsample(&[1.0, 3.0], 4);
        assert_eq!(out, vec![1.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn test_non_finite_inputs_become_zero() {
        let out = downsample(&[f64::NAN, 2.0, f64::INFINITY, 4.0], 4);
        assert_eq!(out, vec![0.0, 2.0, 0.0, 4.0]);
        let smoothed = smooth_spectrum(&[f64::NAN], &[f64::NEG_INFINITY], 0.5);
        assert_eq!(smoothed, vec![0.0]);
    }

    #[test]
    fn test_empty_source_yields_zeros() {
        assert_eq!(downsample(&[], 3), vec![0.0; 3]);
    }

    #[test]
    fn test_single_step_moves_by_alpha() {
        let out = smooth_spectrum(&[0.0, 4.0], &[4.0, 0.0], 0.25);
        assert_eq!(out, vec![1.0, 3.0]);
    }
}
