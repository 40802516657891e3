//! Fatigue aggregation
//!
//! The score is a per-frame snapshot: it only reflects what the current
//! frame shows and carries nothing over from earlier frames.

use serde::{Deserialize, Serialize};

pub const MAX_FATIGUE: f64 = 100.0;

/// Per-detector fatigue contributions for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FatigueBreakdown {
    pub drowsiness: f64,
    pub distraction: f64,
    pub yawn: f64,
}

impl FatigueBreakdown {
    /// Combined score clamped to [0, 100]
    pub fn score(&self) -> f64 {
        (self.drowsiness + self.distraction + self.yawn).clamp(0.0, MAX_FATIGUE)
    }
}

/// Display band of a fatigue score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatigueBand {
    Normal,
    Warning,
    Danger,
}

impl FatigueBand {
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            FatigueBand::Normal
        } else if score < 60.0 {
            FatigueBand::Warning
        } else {
            FatigueBand::Danger
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_conditions() {
        let breakdown = FatigueBreakdown {
            drowsiness: 40.0,
            distraction: 15.0,
            yawn: 20.0,
        };
        assert_eq!(breakdown.score(), 75.0);
        assert_eq!(FatigueBand::from_score(breakdown.score()), FatigueBand::Danger);
    }

    #[test]
    fn test_clear_frame_is_zero() {
        assert_eq!(FatigueBreakdown::default().score(), 0.0);
        assert_eq!(FatigueBand::from_score(0.0), FatigueBand::Normal);
        assert_eq!(FatigueBand::from_score(30.0), FatigueBand::Warning);
    }

    proptest! {
        #[test]
        fn prop_score_is_bounded(
            drowsiness in 0.0f64..500.0,
            distraction in 0.0f64..500.0,
            yawn in 0.0f64..500.0,
        ) {
            let score = FatigueBreakdown { drowsiness, distraction, yawn }.score();
            prop_assert!((0.0..=MAX_FATIGUE).contains(&score));
        }
    }
}
