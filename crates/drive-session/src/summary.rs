//! Trip summary

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// End-of-trip report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub trip_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Engine-time duration (milliseconds)
    pub duration_ms: u64,
    pub safety_score: u32,
    pub interventions: u32,
    /// Sleep episodes counted during the trip
    pub sleep_episodes: u32,
    pub motion_events: u32,
}

impl TripSummary {
    pub(crate) fn new(trip_id: Uuid, started_at: DateTime<Utc>, duration_ms: u64) -> Self {
        let elapsed = Duration::milliseconds(i64::try_from(duration_ms).unwrap_or(i64::MAX));
        Self {
            trip_id,
            started_at,
            ended_at: started_at + elapsed,
            duration_ms,
            safety_score: 0,
            interventions: 0,
            sleep_episodes: 0,
            motion_events: 0,
        }
    }

    /// Duration as `HH:MM:SS`
    pub fn duration_hms(&self) -> String {
        let total_s = self.duration_ms / 1000;
        format!(
            "{:02}:{:02}:{:02}",
            total_s / 3600,
            (total_s % 3600) / 60,
            total_s % 60
        )
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_ms as f64 / 60_000.0
    }
}

impl fmt::Display for TripSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trip completed: {:.1} min, Safety Score: {}, Sleep Episodes: {}",
            self.duration_minutes(),
            self.safety_score,
            self.sleep_episodes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_format() {
        let mut summary = TripSummary::new(Uuid::new_v4(), Utc::now(), 3_723_400);
        assert_eq!(summary.duration_hms(), "01:02:03");

        summary.safety_score = 86;
        summary.sleep_episodes = 2;
        assert_eq!(
            summary.to_string(),
            "Trip completed: 62.1 min, Safety Score: 86, Sleep Episodes: 2"
        );
    }

    #[test]
    fn test_end_time_follows_duration() {
        let started_at = Utc::now();
        let summary = TripSummary::new(Uuid::new_v4(), started_at, 90_000);
        assert_eq!(summary.ended_at - started_at, Duration::seconds(90));
        assert_eq!(summary.duration_hms(), "00:01:30");
    }
}
