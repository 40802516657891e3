//! Kinematic event detection
//!
//! Classifies accelerometer/gyroscope samples into driving events:
//! - Rapid acceleration
//! - Hard braking
//! - Sharp turns
//!
//! Also provides a simulated motion source for demos without sensors.

pub mod detector;
pub mod sample;
pub mod simulator;

pub use detector::{KinematicConfig, KinematicDetector, MotionEvent, MotionEventKind};
pub use sample::{MotionLevel, MotionSample};
pub use simulator::{MotionSimulator, SimulatorConfig};

use thiserror::Error;

/// Kinematics error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    #[error("Motion sample field {0} is not finite")]
    NonFinite(&'static str),

    #[error("Invalid simulator period: {0}ms")]
    InvalidPeriod(u64),

    #[error("Invalid kinematic setting: {0}")]
    InvalidConfig(&'static str),
}
