use crate::config::DetectionConfig;
use crate::types::{LeakState, SensorNode};

/// Thresholds on the maximum ultrasonic confidence.
///
/// `NORMAL` up to and including `detected`, `DETECTED` up to and including
/// `critical`, `CRITICAL` above.
#[derive(Debug, Clone, Copy)]
pub struct LeakClassifier {
    detected: f64,
    critical: f64,
    ceiling: f64,
    slope: f64,
}

impl LeakClassifier {
    pub fn new(params: &DetectionConfig) -> Self {
        Self {
            detected: params.detected_confidence,
            critical: params.critical_confidence,
            ceiling: params.system_confidence_ceiling,
            slope: params.system_confidence_slope,
        }
    }

    pub fn classify(&self, max_confidence: f64) -> LeakState {
        if max_confidence > self.critical {
            LeakState::Critical
        } else if max_confidence > self.detected {
            LeakState::Detected
        } else {
            LeakState::Normal
        }
    }

    /// Confidence that the system as a whole is healthy.
    pub fn system_confidence(&self, max_confidence: f64) -> f64 {
        self.ceiling - self.slope * max_confidence
    }

    /// Largest ultrasonic confidence, 0 when there are no ultrasonic nodes.
    pub fn max_confidence(nodes: &[SensorNode]) -> f64 {
        nodes
            .iter()
            .filter_map(SensorNode::confidence)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> LeakClassifier {
        LeakClassifier::new(&DetectionConfig::default())
    }

    #[test]
    fn test_threshold_boundaries() {
        let c = classifier();
        assert_eq!(c.classify(0.0), LeakState::Normal);
        assert_eq!(c.classify(0.4), LeakState::Normal);
        assert_eq!(c.classify(0.400_001), LeakState::Detected);
        assert_eq!(c.classify(0.8), LeakState::Detected);
        assert_eq!(c.classify(0.800_001), LeakState::Critical);
        assert_eq!(c.classify(1.0), LeakState::Critical);
    }

    #[test]
    fn test_pure_in_max_confidence() {
        let c = classifier();
        for i in 0..=100 {
            let x = f64::from(i) / 100.0;
            assert_eq!(c.classify(x), c.classify(x));
        }
    }

    #[test]
    fn test_system_confidence_line() {
        let c = classifier();
        assert!((c.system_confidence(0.0) - 0.99).abs() < 1e-12);
        assert!((c.system_confidence(1.0) - 0.69).abs() < 1e-12);
    }

    #[test]
    fn test_max_confidence_ignores_pressure_nodes() {
        let nodes = crate::types::PipelineTopology::reference().nodes;
        assert_eq!(LeakClassifier::max_confidence(&nodes), 0.0);
        assert_eq!(LeakClassifier::max_confidence(&[]), 0.0);
    }
}
