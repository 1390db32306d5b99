//! Time-domain synthesis of what an ultrasonic microphone on the line hears.
//!
//! Per sample:
//! - compressor running: motor carrier plus a higher base tone
//! - broadband noise, louder while the compressor runs
//! - open leak: a high-frequency hiss tone plus noise, both scaled by
//!   `intensity · system_pressure · middle_valve / 100`

use std::f64::consts::TAU;

use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::config::AcousticConfig;
use crate::pipeline::source::SignalSource;

/// Model outputs the synthesizer needs for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcousticInputs {
    pub compressor_active: bool,
    pub leak_intensity: Option<f64>,
    pub system_pressure_psi: f64,
    pub middle_valve: f64,
    /// Simulation time of the first sample (seconds)
    pub sim_time: f64,
}

impl AcousticInputs {
    /// Leak tone amplitude, zero without a leak.
    pub fn leak_amplitude(&self) -> f64 {
        self.leak_intensity.map_or(0.0, |intensity| {
            (intensity * self.system_pressure_psi.max(0.0) * self.middle_valve / 100.0).max(0.0)
        })
    }
}

/// One synthesized buffer with its time-domain statistics.
#[derive(Debug, Clone)]
pub struct AcousticFrame {
    pub samples: Vec<f64>,
    pub sample_rate: f64,
    /// Largest absolute sample
    pub peak: f64,
    pub rms: f64,
}

impl SignalSource for AcousticFrame {
    fn source_name(&self) -> &str {
        "synthetic"
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn buffer(&self) -> &[f64] {
        &self.samples
    }
}

/// Seeded signal generator. Same seed and inputs give the same buffers.
#[derive(Debug, Clone)]
pub struct AcousticSynthesizer {
    params: AcousticConfig,
    rng: StdRng,
}

impl AcousticSynthesizer {
    pub fn new(params: &AcousticConfig, seed: u64) -> Self {
        Self {
            params: params.clone(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn synthesize(&mut self, inputs: &AcousticInputs) -> AcousticFrame {
        let p = &self.params;
        let n = p.fft_size;
        let sr = p.sample_rate_hz;

        let noise_amp = if inputs.compressor_active {
            p.noise_amplitude_active
        } else {
            p.noise_amplitude_idle
        };
        let leak_amp = inputs.leak_amplitude();
        let leak_noise_amp = leak_amp * p.leak_noise_ratio;

        let mut samples = Vec::with_capacity(n);
        let mut peak = 0.0_f64;
        let mut sum_sq = 0.0;

        for i in 0..n {
            let t = inputs.sim_time + i as f64 / sr;
            let mut s = 0.0;

            if inputs.compressor_active {
                s += p.carrier_amplitude * (TAU * p.carrier_frequency_hz * t).sin();
                s += p.base_tone_amplitude * (TAU * p.base_tone_frequency_hz * t).sin();
            }

            let noise: f64 = self.rng.sample(StandardNormal);
            s += noise_amp * noise;

            if leak_amp > 0.0 {
                let hiss: f64 = self.rng.sample(StandardNormal);
                s += leak_amp * (TAU * p.leak_frequency_hz * t).sin() + leak_noise_amp * hiss;
            }

            peak = peak.max(s.abs());
            sum_sq += s * s;
            samples.push(s);
        }

        let rms = if n == 0 { 0.0 } else { (sum_sq / n as f64).sqrt() };

        AcousticFrame {
            samples,
            sample_rate: sr,
            peak,
            rms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{bin_frequency, compute_magnitude_spectrum, find_peak_bin};

    fn running(leak: Option<f64>) -> AcousticInputs {
        AcousticInputs {
            compressor_active: true,
            leak_intensity: leak,
            system_pressure_psi: 100.0,
            middle_valve: 1.0,
            sim_time: 0.0,
        }
    }

    #[test]
    fn test_same_seed_same_buffer() {
        let cfg = AcousticConfig::default();
        let mut a = AcousticSynthesizer::new(&cfg, 7);
        let mut b = AcousticSynthesizer::new(&cfg, 7);
        let fa = a.synthesize(&running(Some(20.0)));
        let fb = b.synthesize(&running(Some(20.0)));
        assert_eq!(fa.samples, fb.samples);
        assert_eq!(fa.samples.len(), cfg.fft_size);
    }

    #[test]
    fn test_peak_and_rms_match_samples() {
        let mut synth = AcousticSynthesizer::new(&AcousticConfig::default(), 1);
        let frame = synth.synthesize(&running(None));
        let peak = frame.samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
        let rms = (frame.samples.iter().map(|s| s * s).sum::<f64>() / frame.samples.len() as f64).sqrt();
        assert!((frame.peak - peak).abs() < 1e-12);
        assert!((frame.rms - rms).abs() < 1e-12);
    }

    #[test]
    fn test_leak_raises_rms_and_dominates_spectrum() {
        let cfg = AcousticConfig::default();
        let mut synth = AcousticSynthesizer::new(&cfg, 3);
        let quiet = synth.synthesize(&running(None));
        let leaking = synth.synthesize(&running(Some(60.0)));
        assert!(leaking.rms > quiet.rms * 5.0);

        let mags = compute_magnitude_spectrum(&leaking.samples).unwrap();
        let (bin, _) = find_peak_bin(&mags).unwrap();
        let freq = bin_frequency(bin, cfg.fft_size, cfg.sample_rate_hz);
        assert!((freq - cfg.leak_frequency_hz).abs() < cfg.sample_rate_hz / cfg.fft_size as f64);
    }

    #[test]
    fn test_closed_middle_valve_silences_leak() {
        let inputs = AcousticInputs { middle_valve: 0.0, ..running(Some(100.0)) };
        assert_eq!(inputs.leak_amplitude(), 0.0);
    }

    #[test]
    fn test_idle_is_quiet() {
        let mut synth = AcousticSynthesizer::new(&AcousticConfig::default(), 5);
        let frame = synth.synthesize(&AcousticInputs::default());
        // Gaussian noise at 0.1 sigma
        assert!(frame.rms < 0.2, "rms {}", frame.rms);
    }
}
