//! Simulated motion source
//!
//! Generates smooth synthetic driving motion with occasional acceleration
//! and yaw spikes, for demos on hardware without motion sensors.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::sample::MotionSample;
use crate::KinematicsError;

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Sample period in milliseconds
    pub period_ms: u64,
    /// Chance per sample of an acceleration spike
    pub accel_spike_probability: f64,
    /// Size of the acceleration spike (m/s²)
    pub accel_spike: f64,
    /// Chance per sample of a yaw spike
    pub gyro_spike_probability: f64,
    /// Size of the yaw spike (rad/s)
    pub gyro_spike: f64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            period_ms: 100,
            accel_spike_probability: 0.02,
            accel_spike: 18.0,
            gyro_spike_probability: 0.01,
            gyro_spike: 3.0,
            seed: None,
        }
    }
}

/// Deterministic signal generator behind the simulator
pub struct MotionSignal {
    phase: f64,
    rng: StdRng,
    config: SimulatorConfig,
}

impl MotionSignal {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            phase: 0.0,
            rng,
            config,
        }
    }

    /// Produce the next sample, stamped with `timestamp_ms`
    pub fn next_sample(&mut self, timestamp_ms: u64) -> MotionSample {
        self.phase += 0.1;
        let t = self.phase;

        let accel_spike = if self.rng.gen::<f64>() < self.config.accel_spike_probability {
            self.config.accel_spike
        } else {
            0.0
        };
        let gyro_spike = if self.rng.gen::<f64>() < self.config.gyro_spike_probability {
            self.config.gyro_spike
        } else {
            0.0
        };

        MotionSample {
            timestamp_ms,
            accel_x: (t * 0.5).sin() * 2.0 + accel_spike,
            accel_y: (t * 0.3).sin() * 1.5,
            accel_z: 9.8 + (t * 0.2).sin() * 0.5,
            gyro_x: (t * 0.4).sin() * 0.3,
            gyro_y: (t * 0.6).sin() * 0.2,
            gyro_z: (t * 0.5).cos() * 0.4 + gyro_spike,
        }
    }
}

/// Simulated motion sensor running as a tokio task
pub struct MotionSimulator {
    receiver: mpsc::Receiver<MotionSample>,
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl MotionSimulator {
    /// Spawn the simulator; samples are stamped relative to `epoch`
    pub fn spawn(config: SimulatorConfig, epoch: Instant) -> Result<Self, KinematicsError> {
        if config.period_ms == 0 {
            return Err(KinematicsError::InvalidPeriod(config.period_ms));
        }

        let (tx, rx) = mpsc::channel::<MotionSample>(100);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let period = time::Duration::from_millis(config.period_ms);

        info!("Starting simulated motion source ({}ms period)", config.period_ms);

        let handle = tokio::spawn(async move {
            let mut signal = MotionSignal::new(config);
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while !shutdown_clone.load(Ordering::SeqCst) {
                ticker.tick().await;
                let timestamp_ms = epoch.elapsed().as_millis() as u64;
                if tx.send(signal.next_sample(timestamp_ms)).await.is_err() {
                    debug!("Motion receiver dropped");
                    break;
                }
            }
        });

        Ok(Self {
            receiver: rx,
            shutdown,
            handle,
        })
    }

    /// Receive next motion sample
    pub async fn next(&mut self) -> Option<MotionSample> {
        self.receiver.recv().await
    }

    /// Stop producing samples
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}

impl Drop for MotionSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}
