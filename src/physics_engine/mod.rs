//! Physics Engine Module
//!
//! Deterministic pneumatic calculations. Everything here is a pure function of
//! its inputs and the elapsed `dt`; no clocks, no shared state.
//!
//! - `pressure_model`: compressor output, two-point pressures and flow velocity
//! - `leak_model`: leak creation, growth and retirement
//!
//! Smoothing rates throughout the crate are expressed per reference tick (60 Hz)
//! and rescaled for the real `dt` with [`smoothing_factor`].

pub mod leak_model;
pub mod pressure_model;

pub use leak_model::LeakModel;
pub use pressure_model::PressureModel;

/// Convert a per-reference-tick smoothing rate into the factor for `dt` seconds.
///
/// `α(dt) = 1 − (1 − rate)^(dt · reference_hz)`, so one reference tick yields
/// exactly `rate` and N short ticks compound to the same result as one long one.
pub fn smoothing_factor(rate: f64, dt: f64, reference_hz: f64) -> f64 {
    if !(dt.is_finite() && dt > 0.0) {
        return 0.0;
    }
    let rate = rate.clamp(0.0, 1.0);
    1.0 - (1.0 - rate).powf(dt * reference_hz)
}

/// Move `current` toward `target` by `alpha`.
#[inline]
pub fn exp_smooth(current: f64, target: f64, alpha: f64) -> f64 {
    current + (target - current) * alpha
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_factor_matches_rate_at_reference_tick() {
        let a = smoothing_factor(0.1, 1.0 / 60.0, 60.0);
        assert!((a - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_factor_compounds() {
        // two half ticks equal one full tick
        let half = smoothing_factor(0.1, 1.0 / 120.0, 60.0);
        let mut v = 0.0;
        v = exp_smooth(v, 1.0, half);
        v = exp_smooth(v, 1.0, half);
        let full = exp_smooth(0.0, 1.0, smoothing_factor(0.1, 1.0 / 60.0, 60.0));
        assert!((v - full).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_factor_degenerate_dt() {
        assert_eq!(smoothing_factor(0.1, 0.0, 60.0), 0.0);
        assert_eq!(smoothing_factor(0.1, -1.0, 60.0), 0.0);
        assert_eq!(smoothing_factor(0.1, f64::NAN, 60.0), 0.0);
    }

    #[test]
    fn test_exp_smooth_converges_and_stays() {
        let alpha = smoothing_factor(0.05, 1.0 / 60.0, 60.0);
        let mut v = 0.0;
        for _ in 0..1000 {
            v = exp_smooth(v, 42.0, alpha);
        }
        assert!((v - 42.0).abs() < 1e-6);
        for _ in 0..100 {
            v = exp_smooth(v, 42.0, alpha);
            assert!((v - 42.0).abs() < 1e-6);
        }
    }
}
