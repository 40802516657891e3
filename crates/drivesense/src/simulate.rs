//! Simulated drive
//!
//! Runs the monitor service against a scripted driver and the simulated
//! motion source. The driver repeats a 20 second cycle: alert, then a
//! long eye closure, a yawn, and a glance away from the road.

use anyhow::{Context, Result};
use dms::{FaceMetrics, HeadPose};
use drive_session::{FaceInput, MonitorService, MonitoringSession, TripSummary};
use intervention::{Dispatchers, MessagePicker};
use kinematics::MotionSimulator;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::settings::Settings;

const CYCLE_MS: u64 = 20_000;
const FRAME_PERIOD_MS: u64 = 100;

const OPEN_EAR: f64 = 0.3;
const CLOSED_EAR: f64 = 0.15;
const RESTING_MAR: f64 = 0.2;
const YAWN_MAR: f64 = 0.8;

/// Scripted facial metrics at `t_ms` into the drive
pub fn scripted_face(t_ms: u64) -> FaceMetrics {
    let t = t_ms % CYCLE_MS;

    let ear = if (8_000..12_500).contains(&t) {
        CLOSED_EAR
    } else {
        OPEN_EAR
    };
    let mar = if (15_000..17_000).contains(&t) {
        YAWN_MAR
    } else {
        RESTING_MAR
    };
    let head_pose = if (18_000..19_000).contains(&t) {
        HeadPose::LookingAway
    } else {
        HeadPose::Centered
    };

    FaceMetrics::from_values(ear, ear, mar, head_pose)
}

/// Drive for `seconds` and return the trip summary
pub async fn run_simulation(
    settings: &Settings,
    seconds: u64,
    dispatchers: Dispatchers,
) -> Result<TripSummary> {
    let picker = settings
        .message_seed
        .map(MessagePicker::seeded)
        .unwrap_or_default();
    let session = MonitoringSession::with_parts(
        settings.monitor.clone(),
        settings.kinematics.clone(),
        picker,
    )?;

    let epoch = Instant::now();
    let handle = MonitorService::new(session, dispatchers, epoch).spawn()?;

    let mut simulator = MotionSimulator::spawn(settings.simulator.clone(), epoch)
        .context("Failed to start motion simulator")?;
    let motion = handle.motion_sender();
    let forwarder = tokio::spawn(async move {
        while let Some(sample) = simulator.next().await {
            if motion.send(sample).await.is_err() {
                debug!("Monitor service closed, motion forwarding ended");
                break;
            }
        }
    });

    info!("Simulating a {}s drive", seconds);
    let end = epoch + Duration::from_secs(seconds);
    let mut frames = time::interval(Duration::from_millis(FRAME_PERIOD_MS));
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let tick = frames.tick().await;
        if tick >= end {
            break;
        }
        let timestamp_ms = handle.now_ms();
        handle
            .send_face(FaceInput::Metrics {
                metrics: scripted_face(timestamp_ms),
                timestamp_ms,
            })
            .await?;
    }

    forwarder.abort();
    let summary = handle.stop().await?;
    info!("{}", summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervention::{Action, ActionRecorder};
    use kinematics::SimulatorConfig;

    #[test]
    fn test_script_cycle() {
        assert_eq!(scripted_face(0).ear_avg, OPEN_EAR);
        assert_eq!(scripted_face(8_000).ear_avg, CLOSED_EAR);
        assert_eq!(scripted_face(12_499).ear_avg, CLOSED_EAR);
        assert_eq!(scripted_face(12_500).ear_avg, OPEN_EAR);
        assert_eq!(scripted_face(16_000).mar, YAWN_MAR);
        assert_eq!(scripted_face(18_500).head_pose, HeadPose::LookingAway);
        assert_eq!(scripted_face(28_000).ear_avg, CLOSED_EAR);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_drive() {
        let settings = Settings {
            message_seed: Some(5),
            simulator: SimulatorConfig {
                seed: Some(5),
                accel_spike_probability: 0.0,
                gyro_spike_probability: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let recorder = ActionRecorder::new();

        let summary = run_simulation(&settings, 20, recorder.dispatchers())
            .await
            .unwrap();

        assert_eq!(summary.sleep_episodes, 1);
        assert_eq!(summary.motion_events, 0);
        assert!(summary.safety_score < 100);

        let actions = recorder.actions();
        assert!(actions.iter().any(|action| matches!(
            action,
            Action::Alert(entry) if entry.message.contains("Yawning")
        )));
        assert!(actions.iter().any(|action| matches!(
            action,
            Action::Alert(entry) if entry.message.contains("distracted")
        )));
    }
}
