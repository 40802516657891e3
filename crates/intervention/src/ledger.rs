//! Safety score ledger

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Score at the start of every session
pub const INITIAL_SAFETY_SCORE: u32 = 100;

/// Display band of the safety score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyBand {
    Good,
    Fair,
    Poor,
}

impl SafetyBand {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            SafetyBand::Good
        } else if score >= 50 {
            SafetyBand::Fair
        } else {
            SafetyBand::Poor
        }
    }
}

/// Session safety score and intervention count.
///
/// The score only goes down during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyLedger {
    score: u32,
    interventions: u32,
}

impl Default for SafetyLedger {
    fn default() -> Self {
        Self {
            score: INITIAL_SAFETY_SCORE,
            interventions: 0,
        }
    }
}

impl SafetyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deduct `cost` points, floored at zero. Returns the new score.
    pub fn deduct(&mut self, cost: u32) -> u32 {
        self.score = self.score.saturating_sub(cost);
        debug!("Safety score -{} -> {}", cost, self.score);
        self.score
    }

    pub fn record_intervention(&mut self) -> u32 {
        self.interventions = self.interventions.saturating_add(1);
        self.interventions
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn interventions(&self) -> u32 {
        self.interventions
    }

    pub fn band(&self) -> SafetyBand {
        SafetyBand::from_score(self.score)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_deduct_floors_at_zero() {
        let mut ledger = SafetyLedger::new();
        assert_eq!(ledger.deduct(10), 90);
        assert_eq!(ledger.deduct(95), 0);
        assert_eq!(ledger.deduct(2), 0);
        assert_eq!(ledger.band(), SafetyBand::Poor);
    }

    #[test]
    fn test_bands() {
        assert_eq!(SafetyBand::from_score(100), SafetyBand::Good);
        assert_eq!(SafetyBand::from_score(80), SafetyBand::Good);
        assert_eq!(SafetyBand::from_score(79), SafetyBand::Fair);
        assert_eq!(SafetyBand::from_score(50), SafetyBand::Fair);
        assert_eq!(SafetyBand::from_score(49), SafetyBand::Poor);
    }

    #[test]
    fn test_reset() {
        let mut ledger = SafetyLedger::new();
        ledger.deduct(30);
        ledger.record_intervention();
        ledger.reset();
        assert_eq!(ledger.score(), INITIAL_SAFETY_SCORE);
        assert_eq!(ledger.interventions(), 0);
    }

    proptest! {
        #[test]
        fn score_stays_in_range_and_never_increases(costs in prop::collection::vec(0u32..50, 0..100)) {
            let mut ledger = SafetyLedger::new();
            let mut previous = ledger.score();
            for cost in costs {
                let score = ledger.deduct(cost);
                prop_assert!(score <= INITIAL_SAFETY_SCORE);
                prop_assert!(score <= previous);
                previous = score;
            }
        }
    }
}
