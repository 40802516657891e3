//! Drowsiness detection
//!
//! Hysteresis state machine over the average EAR:
//! `Alert -> EyesClosing -> Sleeping -> Alert`. Entering `Sleeping` may
//! count a new episode; episodes closer than [`MIN_EPISODE_GAP_MS`] to the
//! previous counted one are not counted again.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::state::{
    DrowsinessPhase, DrowsinessState, MIN_EPISODE_GAP_MS, MUSIC_ESCALATION_EPISODES,
};

/// Maximum fatigue points contributed by closed eyes
pub const MAX_DROWSINESS_CONTRIBUTION: f64 = 40.0;

/// Drowsiness state-machine transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrowsinessEvent {
    /// Eyes dropped below the EAR threshold
    EyesClosing,

    /// Eyes stayed closed for the configured wait time
    SleepOnset {
        /// Episode count after this onset
        episode_count: u32,
        /// Whether this onset was counted as a new episode
        counted: bool,
        /// Whether continuous beeping was requested
        continuous_alert: bool,
    },

    /// Eyes reopened after sleeping
    Awake,

    /// Face lost while sleeping or closing eyes
    FaceLost { was_sleeping: bool },
}

/// Result of one drowsiness update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrowsinessUpdate {
    pub phase: DrowsinessPhase,
    pub closed_duration_s: f64,
    pub fatigue_contribution: f64,
    pub event: Option<DrowsinessEvent>,
}

/// Drowsiness detector
#[derive(Debug, Clone, Default)]
pub struct DrowsinessDetector {
    state: DrowsinessState,
}

impl DrowsinessDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one EAR sample
    pub fn update(&mut self, ear_avg: f64, now_ms: u64, config: &MonitorConfig) -> DrowsinessUpdate {
        let mut event = None;

        if ear_avg < config.ear_threshold {
            if self.state.eyes_closed_since.is_none() {
                self.state.eyes_closed_since = Some(now_ms);
                event = Some(DrowsinessEvent::EyesClosing);
            }

            let closed_ms = self
                .state
                .eyes_closed_since
                .map(|since| now_ms.saturating_sub(since))
                .unwrap_or(0);

            if closed_ms >= config.wait_time_ms() && !self.state.is_currently_drowsy {
                event = Some(self.enter_sleeping(now_ms));
            }
        } else {
            if self.state.is_currently_drowsy {
                self.state.is_currently_drowsy = false;
                self.state.continuous_alert_active = false;
                event = Some(DrowsinessEvent::Awake);
                info!("Driver awake again (episodes: {})", self.state.episode_count);
            }
            self.state.eyes_closed_since = None;
        }

        let closed_duration_s = self.state.closed_duration_s(now_ms);

        DrowsinessUpdate {
            phase: self.state.phase(),
            closed_duration_s,
            fatigue_contribution: drowsiness_contribution(closed_duration_s, config.wait_time_s),
            event,
        }
    }

    fn enter_sleeping(&mut self, now_ms: u64) -> DrowsinessEvent {
        self.state.is_currently_drowsy = true;

        let counted = self.state.counts_as_new_episode(now_ms);
        if counted {
            self.state.episode_count += 1;
            self.state.last_episode_time = Some(now_ms);
            info!("Sleeping detected, episode {}", self.state.episode_count);
        } else {
            debug!(
                "Sleeping again within {}ms, not counted as a new episode",
                MIN_EPISODE_GAP_MS
            );
        }

        // At the escalation threshold music replaces the beeping
        self.state.continuous_alert_active = self.state.episode_count < MUSIC_ESCALATION_EPISODES;

        DrowsinessEvent::SleepOnset {
            episode_count: self.state.episode_count,
            counted,
            continuous_alert: self.state.continuous_alert_active,
        }
    }

    /// No face in the frame: stop alerting and forget the closure
    /// without counting a wake-up.
    pub fn face_lost(&mut self) -> Option<DrowsinessEvent> {
        let was_sleeping = self.state.is_currently_drowsy;
        let was_closing = self.state.eyes_closed_since.is_some();

        self.state.is_currently_drowsy = false;
        self.state.continuous_alert_active = false;
        self.state.eyes_closed_since = None;

        (was_sleeping || was_closing).then_some(DrowsinessEvent::FaceLost { was_sleeping })
    }

    /// Recovery window elapsed: reset the episode count unless sleeping.
    ///
    /// Returns `true` if the count was reset.
    pub fn complete_recovery(&mut self) -> bool {
        if self.state.is_currently_drowsy {
            debug!("Recovery window elapsed while sleeping, keeping episode count");
            return false;
        }
        info!(
            "Driver stayed alert, resetting {} episodes",
            self.state.episode_count
        );
        self.state.episode_count = 0;
        true
    }

    /// Stop continuous beeping (music escalation took over)
    pub fn suppress_continuous_alert(&mut self) {
        self.state.continuous_alert_active = false;
    }

    pub fn state(&self) -> &DrowsinessState {
        &self.state
    }

    pub fn episode_count(&self) -> u32 {
        self.state.episode_count
    }

    pub fn is_sleeping(&self) -> bool {
        self.state.is_currently_drowsy
    }

    pub fn continuous_alert_active(&self) -> bool {
        self.state.continuous_alert_active
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }
}

/// `min(closed / wait * 40, 40)`
pub fn drowsiness_contribution(closed_duration_s: f64, wait_time_s: f64) -> f64 {
    if closed_duration_s <= 0.0 || wait_time_s <= 0.0 {
        return 0.0;
    }
    (closed_duration_s / wait_time_s * MAX_DROWSINESS_CONTRIBUTION).min(MAX_DROWSINESS_CONTRIBUTION)
}
