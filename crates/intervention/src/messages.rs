//! Driver message catalogue

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const FAMILY: &[&str] = &[
    "Dad, we're waiting for you at home. Drive safe!",
    "Your family loves you. Please drive carefully.",
    "Kids miss you! Come home safely.",
    "We're proud of you. Stay alert and focused.",
];

const MOTIVATIONAL: &[&str] = &[
    "You're doing great! Just a little bit further.",
    "Stay focused - you've got this!",
    "Almost there! Keep your concentration high.",
    "Every safe mile counts. You're a pro!",
];

const WARNING: &[&str] = &[
    "Please take a break. Your safety matters most.",
    "Rest stop ahead - consider taking a short break.",
    "Fatigue detected. Pull over when safe.",
    "Your reaction time is decreasing. Time to rest.",
];

const SAFETY: &[&str] = &[
    "15 drivers achieved perfect safety scores today. You're on track!",
    "Your safety record is excellent. Keep it up!",
    "Safe driving saves lives. You're making a difference.",
    "Top drivers take breaks. Be like them.",
];

/// Message categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Family,
    Motivational,
    Warning,
    Safety,
}

impl MessageCategory {
    pub fn messages(self) -> &'static [&'static str] {
        match self {
            MessageCategory::Family => FAMILY,
            MessageCategory::Motivational => MOTIVATIONAL,
            MessageCategory::Warning => WARNING,
            MessageCategory::Safety => SAFETY,
        }
    }

    /// Category spoken at a fatigue level, if any.
    ///
    /// (70, 75] warning, (75, 85] safety, above 85 family.
    pub fn for_fatigue(fatigue: f64) -> Option<Self> {
        if fatigue > 85.0 {
            Some(MessageCategory::Family)
        } else if fatigue > 75.0 {
            Some(MessageCategory::Safety)
        } else if fatigue > 70.0 {
            Some(MessageCategory::Warning)
        } else {
            None
        }
    }
}

/// Random message selection
#[derive(Debug, Clone)]
pub struct MessagePicker {
    rng: StdRng,
}

impl MessagePicker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible picker for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn pick(&mut self, category: MessageCategory) -> &'static str {
        category
            .messages()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default()
    }
}

impl Default for MessagePicker {
    fn default() -> Self {
        Self::new()
    }
}
