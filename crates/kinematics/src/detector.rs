//! Kinematic event detector

use alerting::Severity;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info};

use crate::sample::MotionSample;
use crate::KinematicsError;

/// Detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicConfig {
    /// Longitudinal acceleration threshold (m/s²), both directions
    pub accel_threshold: f64,
    /// Yaw-rate threshold for sharp turns (rad/s)
    pub gyro_threshold: f64,
    /// Shared debounce window across all event kinds (milliseconds)
    pub debounce_ms: u64,
    /// Number of recent events kept
    pub history: usize,
}

impl KinematicConfig {
    /// Validate thresholds and windows
    pub fn validate(&self) -> Result<(), KinematicsError> {
        if !(self.accel_threshold.is_finite() && self.accel_threshold > 0.0) {
            return Err(KinematicsError::InvalidConfig("accel_threshold"));
        }
        if !(self.gyro_threshold.is_finite() && self.gyro_threshold > 0.0) {
            return Err(KinematicsError::InvalidConfig("gyro_threshold"));
        }
        if self.debounce_ms == 0 {
            return Err(KinematicsError::InvalidConfig("debounce_ms"));
        }
        if self.history == 0 {
            return Err(KinematicsError::InvalidConfig("history"));
        }
        Ok(())
    }
}

impl Default for KinematicConfig {
    fn default() -> Self {
        Self {
            accel_threshold: 15.0,
            gyro_threshold: 2.5,
            debounce_ms: 2_000,
            history: 5,
        }
    }
}

/// Driving event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionEventKind {
    RapidAcceleration,
    HardBraking,
    SharpTurn,
}

impl MotionEventKind {
    /// Safety-score cost of the event
    pub fn cost(self) -> u32 {
        match self {
            MotionEventKind::RapidAcceleration => 5,
            MotionEventKind::HardBraking => 10,
            MotionEventKind::SharpTurn => 5,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            MotionEventKind::HardBraking => Severity::Danger,
            MotionEventKind::RapidAcceleration | MotionEventKind::SharpTurn => Severity::Warning,
        }
    }
}

/// A detected driving event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    pub kind: MotionEventKind,
    pub timestamp_ms: u64,
    /// Acceleration (m/s²) or yaw rate (rad/s) that triggered the event
    pub magnitude: f64,
}

impl MotionEvent {
    pub fn cost(&self) -> u32 {
        self.kind.cost()
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for MotionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MotionEventKind::RapidAcceleration => {
                write!(f, "Rapid Acceleration ({:.1} m/s²)", self.magnitude)
            }
            MotionEventKind::HardBraking => {
                write!(f, "Hard Braking ({:.1} m/s²)", self.magnitude.abs())
            }
            MotionEventKind::SharpTurn => write!(f, "Sharp Turn ({:.2} rad/s)", self.magnitude),
        }
    }
}

/// Bounded FIFO window
#[derive(Debug, Clone)]
struct SlidingWindow<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> SlidingWindow<T> {
    fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(item);
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}

/// Threshold/debounce classifier over motion samples
#[derive(Debug, Clone)]
pub struct KinematicDetector {
    config: KinematicConfig,
    recent: SlidingWindow<MotionEvent>,
    /// Debounce anchor, kept apart from the display history
    last_event_ms: Option<u64>,
}

impl KinematicDetector {
    pub fn new(config: KinematicConfig) -> Self {
        Self {
            recent: SlidingWindow::new(config.history),
            last_event_ms: None,
            config,
        }
    }

    /// Classify a sample; first match wins
    pub fn classify(&self, sample: &MotionSample) -> Option<MotionEventKind> {
        if sample.accel_x > self.config.accel_threshold {
            Some(MotionEventKind::RapidAcceleration)
        } else if sample.accel_x < -self.config.accel_threshold {
            Some(MotionEventKind::HardBraking)
        } else if sample.gyro_z.abs() > self.config.gyro_threshold {
            Some(MotionEventKind::SharpTurn)
        } else {
            None
        }
    }

    /// Process one sample, returning the event it raised (if any)
    pub fn process(&mut self, sample: &MotionSample) -> Result<Option<MotionEvent>, KinematicsError> {
        sample.validate()?;

        if let Some(last_ms) = self.last_event_ms {
            if sample.timestamp_ms.saturating_sub(last_ms) < self.config.debounce_ms {
                return Ok(None);
            }
        }

        let Some(kind) = self.classify(sample) else {
            return Ok(None);
        };

        let magnitude = match kind {
            MotionEventKind::SharpTurn => sample.gyro_z,
            _ => sample.accel_x,
        };
        let event = MotionEvent {
            kind,
            timestamp_ms: sample.timestamp_ms,
            magnitude,
        };

        info!("Motion event: {}", event);
        self.last_event_ms = Some(event.timestamp_ms);
        self.recent.push(event);
        debug!("Recent motion events: {}", self.recent.iter().count());

        Ok(Some(event))
    }

    /// Recent events, oldest first
    pub fn recent_events(&self) -> Vec<MotionEvent> {
        self.recent.iter().copied().collect()
    }

    pub fn config(&self) -> &KinematicConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.recent.clear();
        self.last_event_ms = None;
    }
}

impl Default for KinematicDetector {
    fn default() -> Self {
        Self::new(KinematicConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(timestamp_ms: u64, accel_x: f64, gyro_z: f64) -> MotionSample {
        MotionSample {
            timestamp_ms,
            accel_x,
            accel_z: 9.8,
            gyro_z,
            ..Default::default()
        }
    }

    #[test]
    fn test_classification_order() {
        let detector = KinematicDetector::default();

        assert_eq!(
            detector.classify(&sample(0, 20.0, 3.0)),
            Some(MotionEventKind::RapidAcceleration)
        );
        assert_eq!(
            detector.classify(&sample(0, -16.0, 3.0)),
            Some(MotionEventKind::HardBraking)
        );
        assert_eq!(
            detector.classify(&sample(0, 1.0, -2.6)),
            Some(MotionEventKind::SharpTurn)
        );
        assert_eq!(detector.classify(&sample(0, 15.0, 2.5)), None);
    }

    #[test]
    fn test_debounce_shared_across_kinds() {
        let mut detector = KinematicDetector::default();

        assert!(detector.process(&sample(10_000, 20.0, 0.0)).unwrap().is_some());
        assert!(detector.process(&sample(11_000, 20.0, 0.0)).unwrap().is_none());
        assert!(detector.process(&sample(11_500, -20.0, 0.0)).unwrap().is_none());

        let braking = detector.process(&sample(12_000, -20.0, 0.0)).unwrap().unwrap();
        assert_eq!(braking.kind, MotionEventKind::HardBraking);
        assert_eq!(braking.cost(), 10);
        assert_eq!(braking.severity(), Severity::Danger);
        assert_eq!(detector.recent_events().len(), 2);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut detector = KinematicDetector::default();
        for i in 0..8u64 {
            detector.process(&sample(i * 3_000, 0.0, 3.0)).unwrap();
        }

        let recent = detector.recent_events();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].timestamp_ms, 9_000);
        assert_eq!(recent[4].timestamp_ms, 21_000);
    }

    #[test]
    fn test_quiet_samples_do_not_debounce() {
        let mut detector = KinematicDetector::default();
        assert!(detector.process(&sample(0, 2.0, 0.1)).unwrap().is_none());
        assert!(detector.process(&sample(100, 20.0, 0.0)).unwrap().is_some());
    }

    #[test]
    fn test_event_messages() {
        let event = MotionEvent {
            kind: MotionEventKind::HardBraking,
            timestamp_ms: 0,
            magnitude: -18.34,
        };
        assert_eq!(event.to_string(), "Hard Braking (18.3 m/s²)");

        let turn = MotionEvent {
            kind: MotionEventKind::SharpTurn,
            timestamp_ms: 0,
            magnitude: 3.0,
        };
        assert_eq!(turn.to_string(), "Sharp Turn (3.00 rad/s)");
    }

    #[test]
    fn test_debounce_without_history() {
        let mut detector = KinematicDetector::new(KinematicConfig {
            history: 0,
            ..Default::default()
        });

        assert!(detector.process(&sample(1_000, 20.0, 0.0)).unwrap().is_some());
        assert!(detector.process(&sample(1_100, 20.0, 0.0)).unwrap().is_none());
        assert!(detector.recent_events().is_empty());
        assert!(detector.process(&sample(3_000, 20.0, 0.0)).unwrap().is_some());
    }

    #[test]
    fn test_config_validation() {
        assert!(KinematicConfig::default().validate().is_ok());
        assert_eq!(
            KinematicConfig {
                history: 0,
                ..Default::default()
            }
            .validate(),
            Err(KinematicsError::InvalidConfig("history"))
        );
        assert_eq!(
            KinematicConfig {
                debounce_ms: 0,
                ..Default::default()
            }
            .validate(),
            Err(KinematicsError::InvalidConfig("debounce_ms"))
        );
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut detector = KinematicDetector::default();
        assert!(detector.process(&sample(0, f64::NAN, 0.0)).is_err());
    }

    proptest! {
        #[test]
        fn events_are_spaced_by_debounce(
            steps in prop::collection::vec((1u64..2_000, -25.0f64..25.0, -4.0f64..4.0), 1..200)
        ) {
            let mut detector = KinematicDetector::default();
            let debounce_ms = detector.config().debounce_ms;
            let mut t = 0;
            let mut last_event: Option<u64> = None;

            for (dt, accel_x, gyro_z) in steps {
                t += dt;
                if let Some(event) = detector.process(&sample(t, accel_x, gyro_z)).unwrap() {
                    if let Some(last) = last_event {
                        prop_assert!(event.timestamp_ms - last >= debounce_ms);
                    }
                    last_event = Some(event.timestamp_ms);
                }
            }
        }
    }
}
