//! Facial landmarks and metric extraction
//!
//! Converts a face-mesh landmark set into eye-aspect-ratio (EAR),
//! mouth-aspect-ratio (MAR) and a coarse head-pose classification.
//! All functions here are pure.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DmsError;

/// Number of points in a face-mesh landmark set
pub const LANDMARK_COUNT: usize = 468;

/// Landmark count with refined iris points appended
pub const REFINED_LANDMARK_COUNT: usize = 478;

/// Left eye indices: horizontal corner, two upper lids, corner, two lower lids
pub const LEFT_EYE_INDICES: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Right eye indices, same ordering as [`LEFT_EYE_INDICES`]
pub const RIGHT_EYE_INDICES: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Inner-lip vertical pairs (center, left, right)
pub const MOUTH_VERTICAL_PAIRS: [(usize, usize); 3] = [(13, 14), (312, 311), (82, 87)];

/// Mouth corners
pub const MOUTH_CORNERS: (usize, usize) = (61, 291);

pub const NOSE_TIP: usize = 1;
pub const LEFT_EYE_OUTER: usize = 33;
pub const RIGHT_EYE_OUTER: usize = 263;
pub const CHIN: usize = 152;

const LOOKING_AWAY_DEVIATION: f64 = 0.2;
const HEAD_TURNED_DEVIATION: f64 = 0.15;
const LOOKING_UP_MARGIN: f64 = 0.05;
const LOOKING_DOWN_MARGIN: f64 = 0.1;

/// A single normalized landmark
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 3D Euclidean distance
    pub fn distance(&self, other: &Landmark) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One frame of landmarks from the vision provider.
///
/// Only constructed through [`LandmarkSample::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkSample {
    /// Capture time (milliseconds)
    pub timestamp_ms: u64,
    points: Vec<Landmark>,
}

impl LandmarkSample {
    /// Wrap a landmark set, rejecting wrong counts and non-finite points
    pub fn new(timestamp_ms: u64, points: Vec<Landmark>) -> Result<Self, DmsError> {
        if points.len() != LANDMARK_COUNT && points.len() != REFINED_LANDMARK_COUNT {
            return Err(DmsError::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(DmsError::NonFiniteLandmark { index });
        }
        Ok(Self {
            timestamp_ms,
            points,
        })
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    fn point(&self, index: usize) -> &Landmark {
        &self.points[index]
    }
}

/// Coarse head-pose classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeadPose {
    #[default]
    Centered,
    HeadTurned,
    LookingAway,
    LookingUp,
    LookingDown,
}

impl HeadPose {
    pub fn is_centered(self) -> bool {
        self == HeadPose::Centered
    }
}

impl fmt::Display for HeadPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HeadPose::Centered => "Centered",
            HeadPose::HeadTurned => "Head Turned",
            HeadPose::LookingAway => "Looking Away",
            HeadPose::LookingUp => "Looking Up",
            HeadPose::LookingDown => "Looking Down",
        };
        f.write_str(s)
    }
}

/// Per-frame facial metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceMetrics {
    pub ear_left: f64,
    pub ear_right: f64,
    pub ear_avg: f64,
    pub mar: f64,
    pub head_pose: HeadPose,
}

impl FaceMetrics {
    /// Build metrics from precomputed values
    pub fn from_values(ear_left: f64, ear_right: f64, mar: f64, head_pose: HeadPose) -> Self {
        Self {
            ear_left,
            ear_right,
            ear_avg: (ear_left + ear_right) / 2.0,
            mar,
            head_pose,
        }
    }

    /// Reject metrics that cannot describe a real face
    pub fn validate(&self) -> Result<(), DmsError> {
        let fields = [
            ("ear_left", self.ear_left),
            ("ear_right", self.ear_right),
            ("ear_avg", self.ear_avg),
            ("mar", self.mar),
        ];
        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((name, _)) => Err(DmsError::NonFiniteMetric(*name)),
            None => Ok(()),
        }
    }

    /// Extract all metrics from a landmark sample
    pub fn extract(sample: &LandmarkSample) -> Result<Self, DmsError> {
        let ear_left = eye_aspect_ratio(sample, &LEFT_EYE_INDICES)?;
        let ear_right = eye_aspect_ratio(sample, &RIGHT_EYE_INDICES)?;
        let mar = mouth_aspect_ratio(sample)?;
        let head_pose = classify_head_pose(sample);

        Ok(Self::from_values(ear_left, ear_right, mar, head_pose))
    }
}

/// EAR = (|p1-p5| + |p2-p4|) / (2 |p0-p3|)
pub fn eye_aspect_ratio(sample: &LandmarkSample, indices: &[usize; 6]) -> Result<f64, DmsError> {
    let p = (*indices).map(|i| *sample.point(i));
    let v1 = p[1].distance(&p[5]);
    let v2 = p[2].distance(&p[4]);
    let h = p[0].distance(&p[3]);

    finite_ratio("eye", v1 + v2, 2.0 * h)
}

/// MAR = (v1 + v2 + v3) / (3 h)
pub fn mouth_aspect_ratio(sample: &LandmarkSample) -> Result<f64, DmsError> {
    let vertical: f64 = MOUTH_VERTICAL_PAIRS
        .iter()
        .map(|&(top, bottom)| sample.point(top).distance(sample.point(bottom)))
        .sum();
    let h = sample
        .point(MOUTH_CORNERS.0)
        .distance(sample.point(MOUTH_CORNERS.1));

    finite_ratio("mouth", vertical, 3.0 * h)
}

/// Classify head pose from nose, eye corners and chin
pub fn classify_head_pose(sample: &LandmarkSample) -> HeadPose {
    let nose = sample.point(NOSE_TIP);
    let left_eye = sample.point(LEFT_EYE_OUTER);
    let right_eye = sample.point(RIGHT_EYE_OUTER);
    let chin = sample.point(CHIN);

    let eye_center_y = (left_eye.y + right_eye.y) / 2.0;
    let deviation = (nose.x - 0.5).abs();

    if deviation > LOOKING_AWAY_DEVIATION {
        HeadPose::LookingAway
    } else if deviation > HEAD_TURNED_DEVIATION {
        HeadPose::HeadTurned
    } else if nose.y < eye_center_y - LOOKING_UP_MARGIN {
        HeadPose::LookingUp
    } else if nose.y > chin.y - LOOKING_DOWN_MARGIN {
        HeadPose::LookingDown
    } else {
        HeadPose::Centered
    }
}

fn finite_ratio(feature: &'static str, numerator: f64, denominator: f64) -> Result<f64, DmsError> {
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        Ok(ratio)
    } else {
        Err(DmsError::DegenerateGeometry(feature))
    }
}
