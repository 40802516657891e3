//! Music controller

use dms::state::MUSIC_ESCALATION_EPISODES;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::action::Action;

/// Volume set for high-energy playback
pub const ENERGETIC_VOLUME: f64 = 0.8;

/// Playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicMode {
    #[default]
    Normal,
    Upbeat,
    Energetic,
    Critical,
}

impl fmt::Display for MusicMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MusicMode::Normal => "normal",
            MusicMode::Upbeat => "upbeat",
            MusicMode::Energetic => "energetic",
            MusicMode::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Who is asking for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayRequest {
    /// System escalation
    pub force: bool,
    /// Driver pressed play
    pub user_initiated: bool,
}

impl PlayRequest {
    pub const FORCED: PlayRequest = PlayRequest {
        force: true,
        user_initiated: false,
    };

    pub const USER: PlayRequest = PlayRequest {
        force: false,
        user_initiated: true,
    };
}

/// Tracks what the music player is doing
#[derive(Debug, Clone, PartialEq)]
pub struct MusicController {
    playing: bool,
    mode: MusicMode,
    volume: f64,
}

impl Default for MusicController {
    fn default() -> Self {
        Self {
            playing: false,
            mode: MusicMode::Normal,
            volume: 1.0,
        }
    }
}

impl MusicController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playback.
    ///
    /// Automatic starts are refused unless forced or the driver has had
    /// enough sleep episodes.
    pub fn play(&mut self, request: PlayRequest, episode_count: u32) -> Vec<Action> {
        if !request.force && !request.user_initiated && episode_count < MUSIC_ESCALATION_EPISODES {
            debug!("Music start refused ({} episodes)", episode_count);
            return Vec::new();
        }
        if self.playing {
            return Vec::new();
        }

        info!("Music started");
        self.playing = true;
        vec![Action::StartMusic]
    }

    pub fn pause(&mut self) -> Vec<Action> {
        if !self.playing {
            return Vec::new();
        }

        info!("Music paused");
        self.playing = false;
        vec![Action::PauseMusic]
    }

    /// Retune already-playing music to the fatigue level. Never starts
    /// playback.
    pub fn adjust_for_fatigue(&mut self, fatigue: f64) -> Vec<Action> {
        let mut actions = Vec::new();

        if fatigue < 30.0 {
            self.switch_mode(MusicMode::Normal, &mut actions);
        } else if fatigue < 60.0 {
            self.switch_mode(MusicMode::Upbeat, &mut actions);
        } else if fatigue < 80.0 {
            if self.playing && self.mode != MusicMode::Energetic {
                self.volume = ENERGETIC_VOLUME;
                actions.push(Action::SetVolume {
                    volume: ENERGETIC_VOLUME,
                });
            }
            self.switch_mode(MusicMode::Energetic, &mut actions);
        } else {
            actions.extend(self.pause());
            self.mode = MusicMode::Critical;
        }

        actions
    }

    fn switch_mode(&mut self, mode: MusicMode, actions: &mut Vec<Action>) {
        if self.playing && self.mode != mode {
            debug!("Music mode {} -> {}", self.mode, mode);
            self.mode = mode;
            actions.push(Action::SetMusicMode { mode });
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn mode(&self) -> MusicMode {
        self.mode
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
