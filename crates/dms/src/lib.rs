//! Driver Monitoring System (DMS)
//!
//! Per-frame driver state analysis from facial landmarks:
//! - Eye aspect ratio (drowsiness, sleep episodes)
//! - Mouth aspect ratio (yawning)
//! - Head pose (distraction)
//! - Snapshot fatigue score
//!
//! The detectors hold their own state and share nothing with each other;
//! cooldowns go through the caller's [`alerting::AlertTagRegistry`].

pub mod analysis;
pub mod config;
pub mod distraction;
pub mod drowsiness;
pub mod fatigue;
pub mod landmarks;
pub mod state;
pub mod yawn;

pub use analysis::{DmsAnalysis, DmsEvent, DriverStatus};
pub use config::{ConfigError, MonitorConfig};
pub use distraction::{DistractionDetector, DistractionUpdate};
pub use drowsiness::{DrowsinessDetector, DrowsinessEvent, DrowsinessUpdate};
pub use fatigue::{FatigueBand, FatigueBreakdown};
pub use landmarks::{FaceMetrics, HeadPose, Landmark, LandmarkSample};
pub use state::{DrowsinessPhase, DrowsinessState, YawnState};
pub use yawn::{YawnDetector, YawnUpdate};

use alerting::AlertTagRegistry;
use thiserror::Error;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Landmark {index} has a non-finite coordinate")]
    NonFiniteLandmark { index: usize },

    #[error("Degenerate {0} geometry")]
    DegenerateGeometry(&'static str),

    #[error("Facial metric {0} is not finite")]
    NonFiniteMetric(&'static str),
}

/// Driver monitoring module
#[derive(Debug, Clone, Default)]
pub struct DmsModule {
    drowsiness: DrowsinessDetector,
    yawn: YawnDetector,
    distraction: DistractionDetector,
}

impl DmsModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a landmark frame for driver state
    pub fn analyze(
        &mut self,
        sample: &LandmarkSample,
        config: &MonitorConfig,
        tags: &mut AlertTagRegistry,
    ) -> Result<DmsAnalysis, DmsError> {
        let metrics = FaceMetrics::extract(sample)?;
        Ok(self.analyze_metrics(metrics, sample.timestamp_ms, config, tags))
    }

    /// Analyze precomputed facial metrics
    pub fn analyze_metrics(
        &mut self,
        metrics: FaceMetrics,
        now_ms: u64,
        config: &MonitorConfig,
        tags: &mut AlertTagRegistry,
    ) -> DmsAnalysis {
        let drowsiness = self.drowsiness.update(metrics.ear_avg, now_ms, config);
        let distraction = self.distraction.update(metrics.head_pose, now_ms, tags);
        let yawn = self.yawn.update(metrics.mar, now_ms, config, tags);

        let mut events = Vec::new();
        if let Some(event) = drowsiness.event {
            events.push(DmsEvent::Drowsiness(event));
        }
        if distraction.beep {
            events.push(DmsEvent::DistractionBeep(distraction.head_pose));
        }
        if distraction.alert {
            events.push(DmsEvent::Distraction(distraction.head_pose));
        }
        if yawn.yawn_detected {
            events.push(DmsEvent::Yawn {
                duration_s: yawn.open_duration_s,
            });
        }

        DmsAnalysis {
            timestamp_ms: now_ms,
            face_detected: true,
            metrics: Some(metrics),
            fatigue: FatigueBreakdown {
                drowsiness: drowsiness.fatigue_contribution,
                distraction: distraction.fatigue_contribution,
                yawn: yawn.fatigue_contribution,
            },
            status: DmsAnalysis::derive_status(&drowsiness, &distraction, &yawn),
            drowsiness: Some(drowsiness),
            yawn: Some(yawn),
            distraction: Some(distraction),
            events,
        }
    }

    /// No face in the frame: reset eye and mouth timers without counting
    /// a wake-up.
    pub fn face_lost(&mut self, now_ms: u64) -> DmsAnalysis {
        let events = self
            .drowsiness
            .face_lost()
            .map(DmsEvent::Drowsiness)
            .into_iter()
            .collect();
        self.yawn.clear();

        DmsAnalysis {
            timestamp_ms: now_ms,
            face_detected: false,
            status: DriverStatus::NoFace,
            events,
            ..Default::default()
        }
    }

    pub fn drowsiness(&self) -> &DrowsinessDetector {
        &self.drowsiness
    }

    pub fn drowsiness_mut(&mut self) -> &mut DrowsinessDetector {
        &mut self.drowsiness
    }

    pub fn yawn(&self) -> &YawnDetector {
        &self.yawn
    }

    /// Reset driver state (on session start)
    pub fn reset_state(&mut self) {
        self.drowsiness.reset();
        self.yawn.reset();
        self.distraction.reset();
    }
}
