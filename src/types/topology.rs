//! Pipeline geometry and sensor placement.

use serde::{Deserialize, Serialize};

/// Point in pipeline space (metres).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Horizontal,
    Vertical,
}

/// One straight run of pipe. Immutable after startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipeSegment {
    pub id: String,
    pub kind: SegmentKind,
    pub start: Vec3,
    pub end: Vec3,
    pub length: f64,
}

impl PipeSegment {
    /// Build a segment; kind is vertical when the run is mostly along y.
    pub fn new(id: impl Into<String>, start: Vec3, end: Vec3) -> Self {
        let dy = (end.y - start.y).abs();
        let horizontal = (end.x - start.x).hypot(end.z - start.z);
        let kind = if dy > horizontal {
            SegmentKind::Vertical
        } else {
            SegmentKind::Horizontal
        };
        Self {
            id: id.into(),
            kind,
            start,
            end,
            length: start.distance(&end),
        }
    }

    /// Position at `fraction` of the way from start to end.
    pub fn point_at(&self, fraction: f64) -> Vec3 {
        self.start.lerp(&self.end, fraction)
    }
}

/// Which modelled pressure a pressure node reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementPoint {
    /// Point 1, downstream of the inlet valve
    Upstream,
    /// Point 2, downstream of the middle valve
    Downstream,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorKind {
    Pressure,
    Ultrasonic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    #[default]
    Online,
    Warning,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

/// Acoustic features extracted for one ultrasonic node on one tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FeatureVector {
    pub peak_frequency_hz: f64,
    pub spectral_energy: f64,
    pub rms_amplitude: f64,
    pub snr: f64,
    /// Unix epoch milliseconds
    pub timestamp_ms: i64,
}

/// Kind-specific mutable measurement record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorMeasurement {
    Pressure {
        point: MeasurementPoint,
        pressure_psi: f64,
        pressure_drop_rate: f64,
    },
    Ultrasonic {
        raw_amplitude: f64,
        confidence: f64,
        status: NodeStatus,
        feature_vector: FeatureVector,
    },
}

/// A sensor fixed on a segment. Created once, updated every tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorNode {
    pub id: String,
    pub segment_id: String,
    pub position: Vec3,
    pub measurement: SensorMeasurement,
}

impl SensorNode {
    pub fn pressure(
        id: impl Into<String>,
        segment: &PipeSegment,
        fraction: f64,
        point: MeasurementPoint,
    ) -> Self {
        Self {
            id: id.into(),
            segment_id: segment.id.clone(),
            position: segment.point_at(fraction),
            measurement: SensorMeasurement::Pressure {
                point,
                pressure_psi: 0.0,
                pressure_drop_rate: 0.0,
            },
        }
    }

    pub fn ultrasonic(id: impl Into<String>, segment: &PipeSegment, fraction: f64) -> Self {
        Self {
            id: id.into(),
            segment_id: segment.id.clone(),
            position: segment.point_at(fraction),
            measurement: SensorMeasurement::Ultrasonic {
                raw_amplitude: 0.0,
                confidence: 0.0,
                status: NodeStatus::Online,
                feature_vector: FeatureVector::default(),
            },
        }
    }

    pub const fn kind(&self) -> SensorKind {
        match self.measurement {
            SensorMeasurement::Pressure { .. } => SensorKind::Pressure,
            SensorMeasurement::Ultrasonic { .. } => SensorKind::Ultrasonic,
        }
    }

    /// Smoothed leak confidence, `None` for pressure nodes.
    pub const fn confidence(&self) -> Option<f64> {
        match self.measurement {
            SensorMeasurement::Ultrasonic { confidence, .. } => Some(confidence),
            SensorMeasurement::Pressure { .. } => None,
        }
    }
}

/// Segments plus the sensors mounted on them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineTopology {
    pub segments: Vec<PipeSegment>,
    pub nodes: Vec<SensorNode>,
}

impl PipelineTopology {
    /// Reference bench layout: inlet run, riser, branch, outlet drop.
    ///
    /// ```text
    ///            riser top (4,3) ──── branch ──── (10,3)
    ///                  │                            │
    ///   (0,0) ─ inlet ─ (4,0)                 outlet ─ (10,0)
    /// ```
    pub fn reference() -> Self {
        let inlet = PipeSegment::new("inlet", Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0));
        let riser = PipeSegment::new("riser", Vec3::new(4.0, 0.0, 0.0), Vec3::new(4.0, 3.0, 0.0));
        let branch =
            PipeSegment::new("branch", Vec3::new(4.0, 3.0, 0.0), Vec3::new(10.0, 3.0, 0.0));
        let outlet =
            PipeSegment::new("outlet", Vec3::new(10.0, 3.0, 0.0), Vec3::new(10.0, 0.0, 0.0));

        let nodes = vec![
            SensorNode::pressure("P1", &inlet, 0.5, MeasurementPoint::Upstream),
            SensorNode::pressure("P2", &branch, 0.8, MeasurementPoint::Downstream),
            SensorNode::ultrasonic("U1", &riser, 0.5),
            SensorNode::ultrasonic("U2", &branch, 0.3),
        ];

        Self {
            segments: vec![inlet, riser, branch, outlet],
            nodes,
        }
    }

    pub fn segment(&self, id: &str) -> Option<&PipeSegment> {
        self.segments.iter().find(|s| s.id == id)
    }
}
