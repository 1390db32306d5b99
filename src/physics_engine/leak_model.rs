//! Leak lifecycle: Inactive ⇄ Active.
//!
//! A leak opens when enabled and the compressor output exceeds the minimum
//! pressure, grows linearly in simulation time, and is discarded the moment
//! either condition fails.

use tracing::{debug, info};

use crate::config::LeakConfig;
use crate::types::{LeakEvent, PipeSegment, Vec3};

#[derive(Debug, Clone)]
pub struct LeakModel {
    params: LeakConfig,
    segment_id: String,
    position: Vec3,
}

impl LeakModel {
    /// `segment` must be the segment named by `params.segment_id`.
    pub fn new(params: &LeakConfig, segment: &PipeSegment) -> Self {
        Self {
            params: params.clone(),
            segment_id: segment.id.clone(),
            position: segment.point_at(params.segment_fraction),
        }
    }

    pub fn step(
        &self,
        prev: Option<&LeakEvent>,
        enabled: bool,
        compressor_psi: f64,
        sim_time: f64,
    ) -> Option<LeakEvent> {
        let pressurised = compressor_psi > self.params.min_pressure_psi;

        if !(enabled && pressurised) {
            if let Some(leak) = prev {
                info!(
                    segment = %leak.segment_id,
                    intensity = leak.intensity,
                    enabled,
                    compressor_psi,
                    "Leak closed"
                );
            }
            return None;
        }

        match prev {
            Some(leak) => {
                let elapsed = (sim_time - leak.start_time).max(0.0);
                let grown = (self.params.base_intensity + elapsed * leak.growth_rate)
                    .min(self.params.max_intensity)
                    // never shrink, even if the ceiling was lowered mid-run
                    .max(leak.intensity);
                Some(LeakEvent {
                    intensity: grown,
                    ..leak.clone()
                })
            }
            None => {
                let intensity = self.params.base_intensity.min(self.params.max_intensity);
                info!(
                    segment = %self.segment_id,
                    x = self.position.x,
                    y = self.position.y,
                    compressor_psi,
                    "Leak opened"
                );
                debug!(intensity, growth_rate = self.params.growth_rate, "Leak parameters");
                Some(LeakEvent {
                    segment_id: self.segment_id.clone(),
                    position: self.position,
                    intensity,
                    growth_rate: self.params.growth_rate,
                    start_time: sim_time,
                })
            }
        }
    }
}
