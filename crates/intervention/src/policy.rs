//! Intervention escalation policy
//!
//! Decides which interventions a fatigue score or an episode count calls
//! for. Repeat dispatches are held back through the alert tag registry.

use alerting::{AlertTag, AlertTagRegistry, Severity};
use dms::state::MUSIC_ESCALATION_EPISODES;
use dms::MonitorConfig;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionBuffer};
use crate::messages::{MessageCategory, MessagePicker};
use crate::music::{MusicController, PlayRequest};

/// Fatigue above which a rest stop is suggested
pub const REST_STOP_FATIGUE: f64 = 80.0;

const MUSIC_ESCALATION_MESSAGE: &str =
    "You have shown drowsiness multiple times. Playing energetic music to help you stay alert.";

const REST_STOP_MESSAGE: &str =
    "Your fatigue level is critical. Please find a safe place to rest immediately.";

/// Escalation policy
#[derive(Debug, Clone, Default)]
pub struct EscalationPolicy {
    picker: MessagePicker,
}

impl EscalationPolicy {
    pub fn new(picker: MessagePicker) -> Self {
        Self { picker }
    }

    /// Force music on once the driver has had enough sleep episodes.
    ///
    /// Returns `true` when music took over from the continuous alert.
    pub fn escalate_episodes(
        &mut self,
        episode_count: u32,
        music: &mut MusicController,
        out: &mut ActionBuffer,
    ) -> bool {
        if episode_count < MUSIC_ESCALATION_EPISODES || music.is_playing() {
            return false;
        }

        warn!("{} sleep episodes, escalating to music", episode_count);
        out.alert(
            format!(
                "Starting energetic music - You've been drowsy {} times!",
                episode_count
            ),
            Severity::Danger,
        );
        out.extend(music.play(PlayRequest::FORCED, episode_count));
        out.speak(MUSIC_ESCALATION_MESSAGE);
        true
    }

    /// Fatigue-driven interventions, run after every facial sample
    pub fn on_fatigue(
        &mut self,
        fatigue: f64,
        config: &MonitorConfig,
        tags: &mut AlertTagRegistry,
        music: &mut MusicController,
        out: &mut ActionBuffer,
    ) {
        if config.auto_music {
            out.extend(music.adjust_for_fatigue(fatigue));
        }
        self.psych_message(fatigue, tags, out);
        self.rest_stop(fatigue, tags, out);
    }

    fn psych_message(&mut self, fatigue: f64, tags: &mut AlertTagRegistry, out: &mut ActionBuffer) {
        if !out.speech_enabled() {
            return;
        }
        let Some(category) = MessageCategory::for_fatigue(fatigue) else {
            return;
        };
        if !tags.try_activate(AlertTag::PsychMessage, out.now_ms()) {
            return;
        }

        debug!("Speaking {:?} message at fatigue {:.0}", category, fatigue);
        let message = self.picker.pick(category);
        out.speak(message);
    }

    fn rest_stop(&mut self, fatigue: f64, tags: &mut AlertTagRegistry, out: &mut ActionBuffer) {
        if fatigue <= REST_STOP_FATIGUE || !tags.try_activate(AlertTag::RestStop, out.now_ms()) {
            return;
        }

        info!("Critical fatigue {:.0}, suggesting rest stop", fatigue);
        out.alert("Critical fatigue! Finding nearby rest stops...", Severity::Danger);
        out.push(Action::FindRestStops);
        out.speak(REST_STOP_MESSAGE);
    }

    /// Speak a motivational message on request
    pub fn test_message(&mut self, out: &mut ActionBuffer) {
        let message = self.picker.pick(MessageCategory::Motivational);
        out.speak(message);
    }
}
