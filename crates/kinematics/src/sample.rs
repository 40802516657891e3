//! Motion samples

use serde::{Deserialize, Serialize};

use crate::KinematicsError;

/// One accelerometer/gyroscope reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionSample {
    /// Timestamp (milliseconds)
    pub timestamp_ms: u64,
    /// Acceleration in X (m/s²), positive forward
    pub accel_x: f64,
    /// Acceleration in Y (m/s²)
    pub accel_y: f64,
    /// Acceleration in Z (m/s²)
    pub accel_z: f64,
    /// Angular velocity X (rad/s)
    pub gyro_x: f64,
    /// Angular velocity Y (rad/s)
    pub gyro_y: f64,
    /// Angular velocity Z (rad/s), yaw rate
    pub gyro_z: f64,
}

impl MotionSample {
    /// Reject samples with NaN or infinite fields
    pub fn validate(&self) -> Result<(), KinematicsError> {
        let fields = [
            ("accel_x", self.accel_x),
            ("accel_y", self.accel_y),
            ("accel_z", self.accel_z),
            ("gyro_x", self.gyro_x),
            ("gyro_y", self.gyro_y),
            ("gyro_z", self.gyro_z),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some((name, _)) => Err(KinematicsError::NonFinite(*name)),
            None => Ok(()),
        }
    }

    /// Total acceleration magnitude (m/s²)
    pub fn total_acceleration(&self) -> f64 {
        (self.accel_x * self.accel_x + self.accel_y * self.accel_y + self.accel_z * self.accel_z)
            .sqrt()
    }

    pub fn level(&self) -> MotionLevel {
        MotionLevel::from_total(self.total_acceleration())
    }
}

/// Display band of the total acceleration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionLevel {
    Safe,
    Warning,
    Danger,
}

impl MotionLevel {
    pub fn from_total(total: f64) -> Self {
        if total > 25.0 {
            MotionLevel::Danger
        } else if total > 15.0 {
            MotionLevel::Warning
        } else {
            MotionLevel::Safe
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_acceleration() {
        let sample = MotionSample {
            accel_x: 3.0,
            accel_y: 4.0,
            accel_z: 0.0,
            ..Default::default()
        };
        assert!((sample.total_acceleration() - 5.0).abs() < 1e-12);
        assert_eq!(sample.level(), MotionLevel::Safe);
    }

    #[test]
    fn test_levels() {
        assert_eq!(MotionLevel::from_total(9.8), MotionLevel::Safe);
        assert_eq!(MotionLevel::from_total(20.0), MotionLevel::Warning);
        assert_eq!(MotionLevel::from_total(30.0), MotionLevel::Danger);
    }

    #[test]
    fn test_validate() {
        let mut sample = MotionSample::default();
        assert!(sample.validate().is_ok());

        sample.gyro_z = f64::INFINITY;
        assert_eq!(sample.validate(), Err(KinematicsError::NonFinite("gyro_z")));
    }
}
