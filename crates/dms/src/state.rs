//! Driver state tracking

use serde::{Deserialize, Serialize};

/// Minimum gap between two counted sleep episodes (milliseconds)
pub const MIN_EPISODE_GAP_MS: u64 = 4_000;

/// Counted episodes at which beeping gives way to music escalation
pub const MUSIC_ESCALATION_EPISODES: u32 = 3;

/// Phase of the drowsiness state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrowsinessPhase {
    #[default]
    Alert,
    EyesClosing,
    Sleeping,
}

/// Drowsiness state (tracked over the session)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessState {
    /// When the eyes were first seen closed in the current closure
    pub eyes_closed_since: Option<u64>,

    /// Currently in the sleeping phase
    pub is_currently_drowsy: bool,

    /// Counted sleep episodes this session
    pub episode_count: u32,

    /// Time of the last counted episode
    pub last_episode_time: Option<u64>,

    /// Continuous beeping requested
    pub continuous_alert_active: bool,
}

impl DrowsinessState {
    pub fn phase(&self) -> DrowsinessPhase {
        if self.is_currently_drowsy {
            DrowsinessPhase::Sleeping
        } else if self.eyes_closed_since.is_some() {
            DrowsinessPhase::EyesClosing
        } else {
            DrowsinessPhase::Alert
        }
    }

    /// Eyes-closed duration at `now_ms` (seconds)
    pub fn closed_duration_s(&self, now_ms: u64) -> f64 {
        self.eyes_closed_since
            .map(|since| now_ms.saturating_sub(since) as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    /// Whether a sleep onset at `now_ms` counts as a new episode
    pub fn counts_as_new_episode(&self, now_ms: u64) -> bool {
        match self.last_episode_time {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > MIN_EPISODE_GAP_MS,
        }
    }

    /// Reset state (on session start)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Yawn state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YawnState {
    /// When the mouth was first seen open in the current opening
    pub mouth_open_since: Option<u64>,

    /// Mirror of the "yawn" tag at the last processed sample
    pub yawn_tag_active: bool,
}

impl YawnState {
    /// Mouth-open duration at `now_ms` (seconds)
    pub fn open_duration_s(&self, now_ms: u64) -> f64 {
        self.mouth_open_since
            .map(|since| now_ms.saturating_sub(since) as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}
