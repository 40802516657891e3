//! Alerting System
//!
//! Provides time-to-live alert tags for cooldown/deduplication, severity
//! levels, and the bounded alert log shown to the driver.

mod log;
mod tags;

pub use log::{AlertEntry, AlertLog, AlertSink, Severity, ALERT_LOG_CAPACITY};
pub use tags::{AlertTag, AlertTagRegistry, TagState};
