//! Intervention actions

use alerting::{AlertEntry, Severity};
use dms::MonitorConfig;
use serde::{Deserialize, Serialize};

use crate::music::MusicMode;

/// Alert tone request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub repetitions: u32,
}

impl Tone {
    /// Repeated while the driver is sleeping
    pub const SLEEP: Tone = Tone {
        frequency_hz: 1200,
        duration_ms: 300,
        repetitions: 1,
    };

    /// Single beep for distraction
    pub const DISTRACTION: Tone = Tone {
        frequency_hz: 800,
        duration_ms: 200,
        repetitions: 1,
    };

    /// Double beep for yawning
    pub const YAWN: Tone = Tone {
        frequency_hz: 600,
        duration_ms: 250,
        repetitions: 2,
    };
}

/// A request to an external collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    PlayTone(Tone),
    Speak { text: String },
    StartMusic,
    PauseMusic,
    SetMusicMode { mode: MusicMode },
    SetVolume { volume: f64 },
    FindRestStops,
    Alert(AlertEntry),
}

/// Collects actions for one processing step, applying the sound and
/// speech toggles of the configuration in effect.
#[derive(Debug, Clone)]
pub struct ActionBuffer {
    now_ms: u64,
    sound_enabled: bool,
    speech_enabled: bool,
    actions: Vec<Action>,
}

impl ActionBuffer {
    pub fn new(now_ms: u64, config: &MonitorConfig) -> Self {
        Self {
            now_ms,
            sound_enabled: config.sound_enabled,
            speech_enabled: config.psych_messages,
            actions: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech_enabled
    }

    /// Play a tone if sound is enabled
    pub fn tone(&mut self, tone: Tone) {
        if self.sound_enabled {
            self.actions.push(Action::PlayTone(tone));
        }
    }

    /// Speak a message if messages are enabled
    pub fn speak(&mut self, text: impl Into<String>) {
        if self.speech_enabled {
            self.actions.push(Action::Speak { text: text.into() });
        }
    }

    /// Add an alert-log entry
    pub fn alert(&mut self, message: impl Into<String>, severity: Severity) {
        self.actions
            .push(Action::Alert(AlertEntry::new(self.now_ms, message, severity)));
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.actions.extend(actions);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_gate_tones_and_speech() {
        let config = MonitorConfig {
            sound_enabled: false,
            psych_messages: false,
            ..Default::default()
        };
        let mut buffer = ActionBuffer::new(5, &config);
        buffer.tone(Tone::SLEEP);
        buffer.speak("hello");
        buffer.alert("still logged", Severity::Warning);

        assert_eq!(
            buffer.into_actions(),
            vec![Action::Alert(AlertEntry::new(5, "still logged", Severity::Warning))]
        );
    }

    #[test]
    fn test_enabled_toggles() {
        let mut buffer = ActionBuffer::new(0, &MonitorConfig::default());
        buffer.tone(Tone::YAWN);
        buffer.speak("hello");

        assert_eq!(
            buffer.actions(),
            &[
                Action::PlayTone(Tone::YAWN),
                Action::Speak {
                    text: "hello".to_string()
                }
            ]
        );
    }
}
