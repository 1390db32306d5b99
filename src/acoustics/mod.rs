//! Synthetic ultrasonic signal generation.

mod synthesizer;

pub use synthesizer::{AcousticFrame, AcousticInputs, AcousticSynthesizer};
