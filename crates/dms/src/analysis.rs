//! DMS analysis results and events

use alerting::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::distraction::DistractionUpdate;
use crate::drowsiness::{DrowsinessEvent, DrowsinessUpdate};
use crate::fatigue::{FatigueBand, FatigueBreakdown};
use crate::landmarks::{FaceMetrics, HeadPose};
use crate::state::DrowsinessPhase;
use crate::yawn::YawnUpdate;

/// Discrete events produced by the facial detectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DmsEvent {
    /// Drowsiness state-machine transition
    Drowsiness(DrowsinessEvent),

    /// Single distraction beep (own cooldown)
    DistractionBeep(HeadPose),

    /// Distraction alert-log entry (tag-gated)
    Distraction(HeadPose),

    /// Yawn lasting at least one second
    Yawn { duration_s: f64 },
}

/// Overall driver status for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriverStatus {
    #[default]
    Alert,
    EyesClosing,
    Sleeping,
    Distracted(HeadPose),
    Yawning,
    NoFace,
}

impl DriverStatus {
    /// Lighting level shown for this status
    pub fn severity(&self) -> Severity {
        match self {
            DriverStatus::Alert => Severity::Safe,
            DriverStatus::Sleeping => Severity::Danger,
            DriverStatus::EyesClosing
            | DriverStatus::Distracted(_)
            | DriverStatus::Yawning
            | DriverStatus::NoFace => Severity::Warning,
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverStatus::Alert => f.write_str("Driver Alert"),
            DriverStatus::EyesClosing => f.write_str("Eyes closing..."),
            DriverStatus::Sleeping => f.write_str("SLEEPING - WAKE UP!"),
            DriverStatus::Distracted(pose) => write!(f, "Distraction: {}", pose),
            DriverStatus::Yawning => f.write_str("Yawning detected"),
            DriverStatus::NoFace => f.write_str("No face detected"),
        }
    }
}

/// Complete DMS analysis of one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Frame time (milliseconds)
    pub timestamp_ms: u64,

    /// Whether a face was detected
    pub face_detected: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FaceMetrics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub drowsiness: Option<DrowsinessUpdate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub yawn: Option<YawnUpdate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub distraction: Option<DistractionUpdate>,

    /// Fatigue contributions of this frame
    pub fatigue: FatigueBreakdown,

    pub status: DriverStatus,

    /// Events raised by this frame
    pub events: Vec<DmsEvent>,
}

impl DmsAnalysis {
    /// Fatigue score of this frame (0-100)
    pub fn fatigue_score(&self) -> f64 {
        self.fatigue.score()
    }

    pub fn fatigue_band(&self) -> FatigueBand {
        FatigueBand::from_score(self.fatigue_score())
    }

    /// Check if any events were raised
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Drowsiness phase after this frame
    pub fn phase(&self) -> DrowsinessPhase {
        self.drowsiness
            .map(|update| update.phase)
            .unwrap_or_default()
    }

    /// Status by severity: sleeping, distraction, closing eyes, yawning
    pub(crate) fn derive_status(
        drowsiness: &DrowsinessUpdate,
        distraction: &DistractionUpdate,
        yawn: &YawnUpdate,
    ) -> DriverStatus {
        match drowsiness.phase {
            DrowsinessPhase::Sleeping => DriverStatus::Sleeping,
            _ if distraction.distracted => DriverStatus::Distracted(distraction.head_pose),
            DrowsinessPhase::EyesClosing => DriverStatus::EyesClosing,
            _ if yawn.mouth_open && yawn.open_duration_s >= 1.0 => DriverStatus::Yawning,
            _ => DriverStatus::Alert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_severity() {
        assert_eq!(DriverStatus::Alert.severity(), Severity::Safe);
        assert_eq!(DriverStatus::Sleeping.severity(), Severity::Danger);
        assert_eq!(
            DriverStatus::Distracted(HeadPose::LookingUp).severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            DriverStatus::Distracted(HeadPose::LookingAway).to_string(),
            "Distraction: Looking Away"
        );
        assert_eq!(DriverStatus::NoFace.to_string(), "No face detected");
    }
}
