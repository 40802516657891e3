//! Alert log and sink

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Number of entries kept in the alert log
pub const ALERT_LOG_CAPACITY: usize = 8;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Safe,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Safe => "safe",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        };
        f.write_str(s)
    }
}

/// A single alert shown to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    /// Engine time of the alert (milliseconds)
    pub timestamp_ms: u64,
    pub message: String,
    pub severity: Severity,
}

impl AlertEntry {
    pub fn new(timestamp_ms: u64, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp_ms,
            message: message.into(),
            severity,
        }
    }
}

/// Receiver for alert entries (display, log file, ...)
pub trait AlertSink {
    fn alert(&mut self, entry: &AlertEntry);
}

/// Bounded alert log, newest entry first
#[derive(Debug, Clone)]
pub struct AlertLog {
    entries: VecDeque<AlertEntry>,
    capacity: usize,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an entry, evicting the oldest when full
    pub fn push(&mut self, entry: AlertEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &AlertEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&AlertEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(ALERT_LOG_CAPACITY)
    }
}
