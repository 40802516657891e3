//! Log-backed collaborators
//!
//! Stand-ins for the audio system, navigation and display when running
//! from the command line: every request becomes a log line.

use alerting::{AlertEntry, AlertLog, AlertSink, Severity, ALERT_LOG_CAPACITY};
use intervention::{AudioDispatcher, Dispatchers, MusicMode, RestStopDispatcher, Tone};
use tracing::{error, info, warn};

/// Logs tones, speech and music changes
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioDispatcher for LogAudio {
    fn play_tone(&mut self, tone: Tone) {
        info!(
            target: "drivesense::audio",
            "Tone {}Hz {}ms x{}", tone.frequency_hz, tone.duration_ms, tone.repetitions
        );
    }

    fn speak(&mut self, text: &str) {
        info!(target: "drivesense::audio", "Speaking: {}", text);
    }

    fn start_music(&mut self) {
        info!(target: "drivesense::audio", "Music playing");
    }

    fn pause_music(&mut self) {
        info!(target: "drivesense::audio", "Music paused");
    }

    fn set_music_mode(&mut self, mode: MusicMode) {
        info!(target: "drivesense::audio", "Music mode: {}", mode);
    }

    fn set_volume(&mut self, volume: f64) {
        info!(target: "drivesense::audio", "Music volume: {:.0}%", volume * 100.0);
    }
}

/// Logs rest-stop searches
#[derive(Debug, Default)]
pub struct LogRestStops;

impl RestStopDispatcher for LogRestStops {
    fn find_nearby_stops(&mut self) {
        warn!(target: "drivesense::navigation", "Searching for nearby rest stops");
    }
}

/// Logs alerts at a level matching their severity and keeps the latest few
#[derive(Debug)]
pub struct LogAlerts {
    recent: AlertLog,
}

impl Default for LogAlerts {
    fn default() -> Self {
        Self {
            recent: AlertLog::new(ALERT_LOG_CAPACITY),
        }
    }
}

impl LogAlerts {
    pub fn recent(&self) -> &AlertLog {
        &self.recent
    }
}

impl AlertSink for LogAlerts {
    fn alert(&mut self, entry: &AlertEntry) {
        match entry.severity {
            Severity::Safe => info!(target: "drivesense::alerts", "[{}ms] {}", entry.timestamp_ms, entry.message),
            Severity::Warning => warn!(target: "drivesense::alerts", "[{}ms] {}", entry.timestamp_ms, entry.message),
            Severity::Danger => error!(target: "drivesense::alerts", "[{}ms] {}", entry.timestamp_ms, entry.message),
        }
        self.recent.push(entry.clone());
    }
}

/// Dispatchers that log every request
pub fn log_dispatchers() -> Dispatchers {
    Dispatchers::new(
        Box::new(LogAudio),
        Box::new(LogRestStops),
        Box::new(LogAlerts::default()),
    )
}
