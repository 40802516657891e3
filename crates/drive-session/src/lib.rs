//! Drive Session
//!
//! A [`MonitoringSession`] owns every piece of per-trip state: detectors,
//! alert tags, music, safety ledger, alert log and timers. Facial and
//! motion samples are fed in one at a time and each call returns the
//! [`intervention::Action`]s to dispatch.
//!
//! [`MonitorService`] runs a session on a tokio task, receiving both sample
//! streams over channels and firing timers on time.

mod service;
mod session;
mod summary;
mod timers;

pub use service::{Control, FaceInput, MonitorHandle, MonitorService};
pub use session::{MonitoringSession, SessionError};
pub use summary::TripSummary;
pub use timers::{
    ScheduledTimer, TimerKind, TimerQueue, CONTINUOUS_ALERT_PERIOD_MS, RECOVERY_WINDOW_MS,
};
