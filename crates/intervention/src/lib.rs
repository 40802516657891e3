//! Driver Interventions
//!
//! Turns fatigue scores and sleep-episode history into interventions:
//! - Music escalation and fatigue-dependent music modes
//! - Psychological and warning messages
//! - Rest-stop suggestions
//! - Safety score deductions
//!
//! Nothing here performs I/O. Interventions are collected as [`Action`]s
//! and handed to external collaborators through [`Dispatchers`].

mod action;
mod dispatch;
mod ledger;
mod messages;
mod music;
mod policy;

pub use action::{Action, ActionBuffer, Tone};
pub use dispatch::{ActionRecorder, AudioDispatcher, Dispatchers, RestStopDispatcher};
pub use ledger::{SafetyBand, SafetyLedger, INITIAL_SAFETY_SCORE};
pub use messages::{MessageCategory, MessagePicker};
pub use music::{MusicController, MusicMode, PlayRequest};
pub use policy::EscalationPolicy;
