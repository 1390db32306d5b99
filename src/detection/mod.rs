//! Leak detection: per-sensor updates and the global alert state.
//!
//! - `node_updater`: derives every sensor's measurement from one tick's model
//!   and acoustic outputs
//! - `classifier`: pure mapping from the strongest node confidence to
//!   [`LeakState`](crate::types::LeakState)

mod classifier;
mod node_updater;

pub use classifier::LeakClassifier;
pub use node_updater::{NodeUpdater, TickObservation};
