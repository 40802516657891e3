//! Distraction detection from head pose

use alerting::{AlertTag, AlertTagRegistry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::landmarks::HeadPose;

/// Minimum gap between two distraction beeps (milliseconds)
pub const BEEP_COOLDOWN_MS: u64 = 3_000;

/// Fatigue points while the head is off-center
pub const DISTRACTION_CONTRIBUTION: f64 = 15.0;

/// Result of one distraction update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistractionUpdate {
    pub head_pose: HeadPose,
    pub distracted: bool,
    pub fatigue_contribution: f64,
    /// Play the single distraction beep
    pub beep: bool,
    /// Log the distraction and charge the safety score
    pub alert: bool,
}

/// Distraction detector
#[derive(Debug, Clone, Default)]
pub struct DistractionDetector {
    last_beep_ms: Option<u64>,
}

impl DistractionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one head-pose sample
    pub fn update(
        &mut self,
        head_pose: HeadPose,
        now_ms: u64,
        tags: &mut AlertTagRegistry,
    ) -> DistractionUpdate {
        if head_pose.is_centered() {
            return DistractionUpdate {
                head_pose,
                distracted: false,
                fatigue_contribution: 0.0,
                beep: false,
                alert: false,
            };
        }

        let beep = match self.last_beep_ms {
            Some(last) => now_ms.saturating_sub(last) >= BEEP_COOLDOWN_MS,
            None => true,
        };
        if beep {
            self.last_beep_ms = Some(now_ms);
        }

        let alert = tags.try_activate(AlertTag::HeadPose, now_ms);
        if alert {
            debug!("Distraction: {}", head_pose);
        }

        DistractionUpdate {
            head_pose,
            distracted: true,
            fatigue_contribution: DISTRACTION_CONTRIBUTION,
            beep,
            alert,
        }
    }

    pub fn reset(&mut self) {
        self.last_beep_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_is_quiet() {
        let mut tags = AlertTagRegistry::new();
        let mut detector = DistractionDetector::new();
        let update = detector.update(HeadPose::Centered, 0, &mut tags);

        assert!(!update.distracted);
        assert!(!update.beep);
        assert!(!update.alert);
        assert_eq!(update.fatigue_contribution, 0.0);
    }

    #[test]
    fn test_short_glance_alerts_once() {
        let mut tags = AlertTagRegistry::new();
        let mut detector = DistractionDetector::new();

        let updates: Vec<_> = (0..=500)
            .step_by(50)
            .map(|t| detector.update(HeadPose::LookingAway, t, &mut tags))
            .collect();

        assert_eq!(updates.iter().filter(|u| u.alert).count(), 1);
        assert_eq!(updates.iter().filter(|u| u.beep).count(), 1);
        assert!(updates
            .iter()
            .all(|u| u.fatigue_contribution == DISTRACTION_CONTRIBUTION));

        let back = detector.update(HeadPose::Centered, 550, &mut tags);
        assert_eq!(back.fatigue_contribution, 0.0);
    }

    #[test]
    fn test_beep_and_tag_cooldowns() {
        let mut tags = AlertTagRegistry::new();
        let mut detector = DistractionDetector::new();

        let first = detector.update(HeadPose::HeadTurned, 1_000, &mut tags);
        assert!(first.beep && first.alert);

        let early = detector.update(HeadPose::HeadTurned, 3_999, &mut tags);
        assert!(!early.beep && !early.alert);

        let later = detector.update(HeadPose::LookingDown, 4_000, &mut tags);
        assert!(later.beep && later.alert);
    }
}
