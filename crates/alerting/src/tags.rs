//! Alert tag registry
//!
//! A tag is a named cooldown window. While a tag is active, the action it
//! guards must not be dispatched again.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Cooldown tags used by the detectors and the escalation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTag {
    /// Distraction alert-log entry and safety deduction
    HeadPose,
    /// Yawn alert
    Yawn,
    /// Psychological message
    PsychMessage,
    /// Rest-stop suggestion
    RestStop,
}

impl AlertTag {
    /// Time-to-live of the tag in milliseconds
    pub fn ttl_ms(self) -> u64 {
        match self {
            AlertTag::HeadPose => 3_000,
            AlertTag::Yawn => 5_000,
            AlertTag::PsychMessage => 30_000,
            AlertTag::RestStop => 60_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertTag::HeadPose => "headpose",
            AlertTag::Yawn => "yawn",
            AlertTag::PsychMessage => "psych_message",
            AlertTag::RestStop => "rest_stop",
        }
    }
}

impl fmt::Display for AlertTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a single tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagState {
    /// Tag is active while `now < expires_at_ms`
    pub expires_at_ms: u64,
    /// Number of times the tag was activated this session
    pub activations: u32,
}

/// Time-to-live deduplication set keyed by [`AlertTag`]
#[derive(Debug, Clone, Default)]
pub struct AlertTagRegistry {
    states: HashMap<AlertTag, TagState>,
}

impl AlertTagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a tag is active at `now_ms`
    pub fn is_active(&self, tag: AlertTag, now_ms: u64) -> bool {
        self.states
            .get(&tag)
            .map(|state| now_ms < state.expires_at_ms)
            .unwrap_or(false)
    }

    /// Activate a tag with its default TTL.
    ///
    /// Returns `true` if the tag was inactive and is now active; activating
    /// an already-active tag is a no-op and returns `false`.
    pub fn try_activate(&mut self, tag: AlertTag, now_ms: u64) -> bool {
        self.try_activate_for(tag, now_ms, tag.ttl_ms())
    }

    /// Activate a tag with an explicit TTL
    pub fn try_activate_for(&mut self, tag: AlertTag, now_ms: u64, ttl_ms: u64) -> bool {
        if self.is_active(tag, now_ms) {
            debug!("Tag {} still active, suppressing", tag);
            return false;
        }

        let state = self.states.entry(tag).or_insert(TagState {
            expires_at_ms: 0,
            activations: 0,
        });
        state.expires_at_ms = now_ms.saturating_add(ttl_ms);
        state.activations += 1;

        debug!(
            "Tag {} active until {} (activation {})",
            tag, state.expires_at_ms, state.activations
        );
        true
    }

    /// Expiry timestamp of a tag, if it was ever activated
    pub fn expires_at(&self, tag: AlertTag) -> Option<u64> {
        self.states.get(&tag).map(|state| state.expires_at_ms)
    }

    /// Number of activations of a tag this session
    pub fn activations(&self, tag: AlertTag) -> u32 {
        self.states.get(&tag).map(|state| state.activations).unwrap_or(0)
    }

    /// Tags active at `now_ms`
    pub fn active_tags(&self, now_ms: u64) -> Vec<AlertTag> {
        self.states
            .iter()
            .filter(|(_, state)| now_ms < state.expires_at_ms)
            .map(|(tag, _)| *tag)
            .collect()
    }

    /// Clear all tag states
    pub fn clear(&mut self) {
        self.states.clear();
    }
}
