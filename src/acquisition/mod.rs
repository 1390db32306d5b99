//! Sensor data acquisition module
//!
//! Polls real pressure/voltage sources over HTTP and feeds the leak-voltage
//! history through the same spectral chain as the synthetic signal.

pub mod hardware;

pub use hardware::{HardwareClient, HardwareError, HardwarePollJob, HardwareSignalBuffer};
