use crate::config::DetectionConfig;
use crate::physics_engine::{exp_smooth, smoothing_factor};
use crate::processing::SpectralFeatures;
use crate::types::{
    FeatureVector, MeasurementPoint, NodeStatus, PressureReadings, SensorMeasurement, SensorNode,
};

/// Everything a sensor can observe on one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickObservation {
    pub pressure: PressureReadings,
    pub compressor_active: bool,
    pub leak_active: bool,
    /// RMS of the acoustic buffer, shared by all ultrasonic nodes
    pub rms: f64,
    /// Largest absolute acoustic sample
    pub peak_amplitude: f64,
    pub spectrum: SpectralFeatures,
    pub dt: f64,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone)]
pub struct NodeUpdater {
    params: DetectionConfig,
    reference_hz: f64,
}

impl NodeUpdater {
    pub fn new(params: &DetectionConfig, reference_hz: f64) -> Self {
        Self {
            params: params.clone(),
            reference_hz,
        }
    }

    /// Produce the next node list. Order and identity are preserved.
    pub fn update(&self, nodes: &[SensorNode], obs: &TickObservation) -> Vec<SensorNode> {
        nodes
            .iter()
            .map(|node| SensorNode {
                measurement: self.update_measurement(&node.measurement, obs),
                ..node.clone()
            })
            .collect()
    }

    fn update_measurement(
        &self,
        prev: &SensorMeasurement,
        obs: &TickObservation,
    ) -> SensorMeasurement {
        match *prev {
            SensorMeasurement::Pressure {
                point,
                pressure_psi: prev_psi,
                ..
            } => {
                let pressure_psi = match point {
                    MeasurementPoint::Upstream => obs.pressure.point1_psi,
                    MeasurementPoint::Downstream => obs.pressure.point2_psi,
                }
                .max(0.0);
                let ticks_per_second = if obs.dt > 0.0 { 1.0 / obs.dt } else { 0.0 };
                SensorMeasurement::Pressure {
                    point,
                    pressure_psi,
                    pressure_drop_rate: (prev_psi - pressure_psi).max(0.0) * ticks_per_second,
                }
            }
            SensorMeasurement::Ultrasonic { confidence, .. } => {
                let p = &self.params;
                let ambient = if obs.compressor_active {
                    p.ambient_noise_active
                } else {
                    p.ambient_noise_idle
                };
                let signal = ambient + obs.rms;
                let snr = if ambient > 0.0 { signal / ambient } else { 0.0 };

                let raw = if obs.leak_active {
                    ((signal - ambient) / p.confidence_span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let alpha = smoothing_factor(p.confidence_smoothing_rate, obs.dt, self.reference_hz);
                let confidence = exp_smooth(confidence, raw, alpha).clamp(0.0, 1.0);
                let status = if confidence > p.node_warning_confidence {
                    NodeStatus::Warning
                } else {
                    NodeStatus::Online
                };

                SensorMeasurement::Ultrasonic {
                    raw_amplitude: obs.peak_amplitude.abs(),
                    confidence,
                    status,
                    feature_vector: FeatureVector {
                        peak_frequency_hz: obs.spectrum.peak_frequency_hz,
                        spectral_energy: obs.spectrum.energy,
                        rms_amplitude: obs.rms,
                        snr,
                        timestamp_ms: obs.timestamp_ms,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PipelineTopology;

    const DT: f64 = 1.0 / 60.0;

    fn observation(rms: f64, leak_active: bool) -> TickObservation {
        TickObservation {
            pressure: PressureReadings {
                point1_psi: 100.0,
                point2_psi: 80.0,
                system_psi: 90.0,
                flow_velocity: 1.8,
            },
            compressor_active: true,
            leak_active,
            rms,
            peak_amplitude: rms * 1.5,
            spectrum: SpectralFeatures::default(),
            dt: DT,
            timestamp_ms: 1_700_000_000_000,
        }
    }

    fn updater() -> NodeUpdater {
        NodeUpdater::new(&DetectionConfig::default(), 60.0)
    }

    fn ultrasonic(nodes: &[SensorNode]) -> (f64, NodeStatus, FeatureVector) {
        nodes
            .iter()
            .find_map(|n| match n.measurement {
                SensorMeasurement::Ultrasonic { confidence, status, feature_vector, .. } => {
                    Some((confidence, status, feature_vector))
                }
                SensorMeasurement::Pressure { .. } => None,
            })
            .unwrap()
    }

    #[test]
    fn test_pressure_nodes_follow_their_point() {
        let nodes = updater().update(&PipelineTopology::reference().nodes, &observation(0.0, false));
        let psi: Vec<f64> = nodes
            .iter()
            .filter_map(|n| match n.measurement {
                SensorMeasurement::Pressure { pressure_psi, .. } => Some(pressure_psi),
                SensorMeasurement::Ultrasonic { .. } => None,
            })
            .collect();
        assert_eq!(psi, vec![100.0, 80.0]);
    }

    #[test]
    fn test_drop_rate_only_counts_falls() {
        let u = updater();
        let mut nodes = u.update(&PipelineTopology::reference().nodes, &observation(0.0, false));
        let mut obs = observation(0.0, false);
        obs.pressure.point1_psi = 99.0;
        nodes = u.update(&nodes, &obs);
        match nodes[0].measurement {
            SensorMeasurement::Pressure { pressure_drop_rate, .. } => {
                assert!((pressure_drop_rate - 60.0).abs() < 1e-9);
            }
            SensorMeasurement::Ultrasonic { .. } => unreachable!(),
        }
        obs.pressure.point1_psi = 120.0;
        nodes = u.update(&nodes, &obs);
        match nodes[0].measurement {
            SensorMeasurement::Pressure { pressure_drop_rate, .. } => assert_eq!(pressure_drop_rate, 0.0),
            SensorMeasurement::Ultrasonic { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_no_leak_means_zero_target_confidence() {
        let u = updater();
        let mut nodes = PipelineTopology::reference().nodes;
        for _ in 0..200 {
            nodes = u.update(&nodes, &observation(80.0, false));
        }
        let (confidence, status, fv) = ultrasonic(&nodes);
        assert_eq!(confidence, 0.0);
        assert_eq!(status, NodeStatus::Online);
        assert!((fv.snr - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_converges_and_warns() {
        let u = updater();
        let mut nodes = PipelineTopology::reference().nodes;
        for _ in 0..300 {
            nodes = u.update(&nodes, &observation(32.0, true));
        }
        let (confidence, status, _) = ultrasonic(&nodes);
        assert!((confidence - 0.8).abs() < 1e-6);
        assert_eq!(status, NodeStatus::Warning);
    }

    #[test]
    fn test_confidence_clamped_to_unit_interval() {
        let u = updater();
        let mut nodes = PipelineTopology::reference().nodes;
        for _ in 0..1000 {
            nodes = u.update(&nodes, &observation(1e6, true));
        }
        let (confidence, _, _) = ultrasonic(&nodes);
        assert!(confidence <= 1.0);
        assert!(confidence > 0.99);
    }
}
