//! Yawn detection
//!
//! MAR above threshold for at least one second counts as a yawn. The "yawn"
//! alert tag keeps a sustained yawn from re-triggering every frame.

use alerting::{AlertTag, AlertTagRegistry};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::MonitorConfig;
use crate::state::YawnState;

/// Mouth-open duration that counts as a yawn (milliseconds)
pub const YAWN_MIN_DURATION_MS: u64 = 1_000;

/// Fatigue points while the mouth is open
pub const YAWN_CONTRIBUTION: f64 = 20.0;

/// Result of one yawn update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YawnUpdate {
    pub mouth_open: bool,
    pub open_duration_s: f64,
    pub fatigue_contribution: f64,
    /// A yawn alert should be raised for this sample
    pub yawn_detected: bool,
}

/// Yawn detector
#[derive(Debug, Clone, Default)]
pub struct YawnDetector {
    state: YawnState,
}

impl YawnDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one MAR sample
    pub fn update(
        &mut self,
        mar: f64,
        now_ms: u64,
        config: &MonitorConfig,
        tags: &mut AlertTagRegistry,
    ) -> YawnUpdate {
        if mar <= config.mar_threshold {
            self.state.mouth_open_since = None;
            self.state.yawn_tag_active = tags.is_active(AlertTag::Yawn, now_ms);
            return YawnUpdate {
                mouth_open: false,
                open_duration_s: 0.0,
                fatigue_contribution: 0.0,
                yawn_detected: false,
            };
        }

        let since = *self.state.mouth_open_since.get_or_insert(now_ms);
        let open_ms = now_ms.saturating_sub(since);

        let yawn_detected =
            open_ms >= YAWN_MIN_DURATION_MS && tags.try_activate(AlertTag::Yawn, now_ms);
        if yawn_detected {
            info!("Yawn detected ({}ms, MAR {:.3})", open_ms, mar);
        }
        self.state.yawn_tag_active = tags.is_active(AlertTag::Yawn, now_ms);

        YawnUpdate {
            mouth_open: true,
            open_duration_s: open_ms as f64 / 1000.0,
            fatigue_contribution: YAWN_CONTRIBUTION,
            yawn_detected,
        }
    }

    /// Forget any mouth opening in progress
    pub fn clear(&mut self) {
        self.state.mouth_open_since = None;
    }

    pub fn state(&self) -> &YawnState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = YawnState::default();
    }
}
