//! Dispatch of actions to external collaborators

use alerting::{AlertEntry, AlertSink};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::action::{Action, Tone};
use crate::music::MusicMode;

/// Audio and speech output. Fire-and-forget.
pub trait AudioDispatcher: Send {
    fn play_tone(&mut self, tone: Tone);
    fn speak(&mut self, text: &str);
    fn start_music(&mut self);
    fn pause_music(&mut self);
    fn set_music_mode(&mut self, mode: MusicMode);
    fn set_volume(&mut self, volume: f64);
}

/// Rest-stop search
pub trait RestStopDispatcher: Send {
    fn find_nearby_stops(&mut self);
}

/// The set of collaborators a session talks to
pub struct Dispatchers {
    audio: Box<dyn AudioDispatcher>,
    rest_stops: Box<dyn RestStopDispatcher>,
    alerts: Box<dyn AlertSink + Send>,
}

impl Dispatchers {
    pub fn new(
        audio: Box<dyn AudioDispatcher>,
        rest_stops: Box<dyn RestStopDispatcher>,
        alerts: Box<dyn AlertSink + Send>,
    ) -> Self {
        Self {
            audio,
            rest_stops,
            alerts,
        }
    }

    /// Route one action
    pub fn dispatch(&mut self, action: &Action) {
        debug!("Dispatching {:?}", action);
        match action {
            Action::PlayTone(tone) => self.audio.play_tone(*tone),
            Action::Speak { text } => self.audio.speak(text),
            Action::StartMusic => self.audio.start_music(),
            Action::PauseMusic => self.audio.pause_music(),
            Action::SetMusicMode { mode } => self.audio.set_music_mode(*mode),
            Action::SetVolume { volume } => self.audio.set_volume(*volume),
            Action::FindRestStops => self.rest_stops.find_nearby_stops(),
            Action::Alert(entry) => self.alerts.alert(entry),
        }
    }

    pub fn dispatch_all<'a>(&mut self, actions: impl IntoIterator<Item = &'a Action>) {
        for action in actions {
            self.dispatch(action);
        }
    }
}

/// Collaborator that records every request as an [`Action`].
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct ActionRecorder {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl ActionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatchers backed entirely by this recorder
    pub fn dispatchers(&self) -> Dispatchers {
        Dispatchers::new(
            Box::new(self.clone()),
            Box::new(self.clone()),
            Box::new(self.clone()),
        )
    }

    fn record(&self, action: Action) {
        match self.actions.lock() {
            Ok(mut actions) => actions.push(action),
            Err(_) => warn!("Action recorder poisoned, dropping {:?}", action),
        }
    }

    /// Snapshot of everything recorded so far
    pub fn actions(&self) -> Vec<Action> {
        self.actions
            .lock()
            .map(|actions| actions.clone())
            .unwrap_or_default()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<Action> {
        self.actions
            .lock()
            .map(|mut actions| std::mem::take(&mut *actions))
            .unwrap_or_default()
    }
}

impl AudioDispatcher for ActionRecorder {
    fn play_tone(&mut self, tone: Tone) {
        self.record(Action::PlayTone(tone));
    }

    fn speak(&mut self, text: &str) {
        self.record(Action::Speak {
            text: text.to_string(),
        });
    }

    fn start_music(&mut self) {
        self.record(Action::StartMusic);
    }

    fn pause_music(&mut self) {
        self.record(Action::PauseMusic);
    }

    fn set_music_mode(&mut self, mode: MusicMode) {
        self.record(Action::SetMusicMode { mode });
    }

    fn set_volume(&mut self, volume: f64) {
        self.record(Action::SetVolume { volume });
    }
}

impl RestStopDispatcher for ActionRecorder {
    fn find_nearby_stops(&mut self) {
        self.record(Action::FindRestStops);
    }
}

impl AlertSink for ActionRecorder {
    fn alert(&mut self, entry: &AlertEntry) {
        self.record(Action::Alert(entry.clone()));
    }
}
