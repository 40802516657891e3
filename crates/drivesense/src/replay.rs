//! Recording replay
//!
//! A recording is JSON lines, one observation per line:
//!
//! ```text
//! {"type":"metrics","timestamp_ms":0,"ear_left":0.31,"ear_right":0.29,"mar":0.2,"head_pose":"Centered"}
//! {"type":"face","timestamp_ms":100,"landmarks":[{"x":0.5,"y":0.5,"z":0.0}, ...]}
//! {"type":"no_face","timestamp_ms":200}
//! {"type":"motion","timestamp_ms":250,"accel_x":0.4,"accel_y":0.1,"accel_z":9.8,"gyro_x":0.0,"gyro_y":0.0,"gyro_z":0.1}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use dms::{DriverStatus, FaceMetrics, HeadPose, Landmark, LandmarkSample};
use drive_session::{MonitoringSession, SessionError, TripSummary};
use intervention::Dispatchers;
use kinematics::MotionSample;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::{debug, info, warn};

/// One recorded observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayRecord {
    Face {
        timestamp_ms: u64,
        landmarks: Vec<Landmark>,
    },
    Metrics {
        timestamp_ms: u64,
        ear_left: f64,
        ear_right: f64,
        mar: f64,
        #[serde(default)]
        head_pose: HeadPose,
    },
    NoFace {
        timestamp_ms: u64,
    },
    Motion(MotionSample),
}

impl ReplayRecord {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            ReplayRecord::Face { timestamp_ms, .. }
            | ReplayRecord::Metrics { timestamp_ms, .. }
            | ReplayRecord::NoFace { timestamp_ms } => *timestamp_ms,
            ReplayRecord::Motion(sample) => sample.timestamp_ms,
        }
    }

    fn apply(
        self,
        session: &mut MonitoringSession,
    ) -> Result<Vec<intervention::Action>, SessionError> {
        match self {
            ReplayRecord::Face {
                timestamp_ms,
                landmarks,
            } => {
                let sample = LandmarkSample::new(timestamp_ms, landmarks)?;
                session.process_face(&sample)
            }
            ReplayRecord::Metrics {
                timestamp_ms,
                ear_left,
                ear_right,
                mar,
                head_pose,
            } => session.process_metrics(
                FaceMetrics::from_values(ear_left, ear_right, mar, head_pose),
                timestamp_ms,
            ),
            ReplayRecord::NoFace { timestamp_ms } => session.process_no_face(timestamp_ms),
            ReplayRecord::Motion(sample) => session.process_motion(&sample),
        }
    }
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub summary: TripSummary,
    pub face_frames: usize,
    pub motion_samples: usize,
    /// Samples the engine refused
    pub rejected: usize,
    pub final_status: DriverStatus,
}

/// Replay a recording through `session`, dispatching every action.
///
/// The trip starts at the first record's timestamp and stops at the last.
pub fn replay<R: BufRead>(
    reader: R,
    session: &mut MonitoringSession,
    dispatchers: &mut Dispatchers,
) -> Result<ReplayReport> {
    let mut face_frames = 0;
    let mut motion_samples = 0;
    let mut rejected = 0;
    let mut last_ms = None;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record: ReplayRecord = serde_json::from_str(line)
            .with_context(|| format!("Malformed record on line {}", line_no))?;
        let timestamp_ms = record.timestamp_ms();

        if last_ms.is_none() {
            let actions = session.start(timestamp_ms)?;
            dispatchers.dispatch_all(&actions);
        }
        last_ms = Some(timestamp_ms);

        match record {
            ReplayRecord::Motion(_) => motion_samples += 1,
            _ => face_frames += 1,
        }

        match record.apply(session) {
            Ok(actions) => dispatchers.dispatch_all(&actions),
            Err(e) => {
                warn!("Line {}: {}", line_no, e);
                rejected += 1;
            }
        }
    }

    let Some(end_ms) = last_ms else {
        anyhow::bail!("Recording contains no records");
    };
    debug!("Replay ended at {}ms", end_ms);

    let final_status = session.status();
    let (summary, actions) = session.stop(end_ms)?;
    dispatchers.dispatch_all(&actions);

    info!(
        "Replayed {} face frames and {} motion samples ({} rejected)",
        face_frames, motion_samples, rejected
    );

    Ok(ReplayReport {
        summary,
        face_frames,
        motion_samples,
        rejected,
        final_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::MonitorConfig;
    use intervention::{Action, ActionRecorder, MessagePicker};
    use kinematics::KinematicConfig;
    use std::fmt::Write;

    fn session() -> MonitoringSession {
        MonitoringSession::with_parts(
            MonitorConfig::default(),
            KinematicConfig::default(),
            MessagePicker::seeded(3),
        )
        .unwrap()
    }

    fn recording() -> String {
        let mut out = String::from("# drowsy driver, one hard brake\n");
        for t in (0..=3_200).step_by(100) {
            writeln!(
                out,
                r#"{{"type":"metrics","timestamp_ms":{},"ear_left":0.1,"ear_right":0.12,"mar":0.2}}"#,
                t
            )
            .unwrap();
        }
        writeln!(
            out,
            r#"{{"type":"motion","timestamp_ms":3250,"accel_x":-19.0,"accel_y":0.0,"accel_z":9.8,"gyro_x":0.0,"gyro_y":0.0,"gyro_z":0.0}}"#
        )
        .unwrap();
        out.push('\n');
        writeln!(out, r#"{{"type":"no_face","timestamp_ms":3300}}"#).unwrap();
        out
    }

    #[test]
    fn test_replay_recording() {
        let recorder = ActionRecorder::new();
        let mut dispatchers = recorder.dispatchers();
        let mut session = session();

        let report = replay(recording().as_bytes(), &mut session, &mut dispatchers).unwrap();

        assert_eq!(report.face_frames, 34);
        assert_eq!(report.motion_samples, 1);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.final_status, DriverStatus::NoFace);
        assert_eq!(report.summary.sleep_episodes, 1);
        assert_eq!(report.summary.motion_events, 1);
        assert_eq!(report.summary.duration_ms, 3_300);
        // Three sleeping frames and one hard brake
        assert_eq!(report.summary.safety_score, 84);
        assert!(!session.is_monitoring());

        let actions = recorder.actions();
        assert!(actions.iter().any(|action| matches!(
            action,
            Action::Alert(entry) if entry.message.starts_with("Trip completed")
        )));
    }

    #[test]
    fn test_bad_landmarks_are_counted_not_fatal() {
        let input = concat!(
            r#"{"type":"face","timestamp_ms":0,"landmarks":[{"x":0.5,"y":0.5,"z":0.0}]}"#,
            "\n",
            r#"{"type":"no_face","timestamp_ms":100}"#,
            "\n"
        );
        let mut session = session();
        let mut dispatchers = ActionRecorder::new().dispatchers();

        let report = replay(input.as_bytes(), &mut session, &mut dispatchers).unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(report.face_frames, 2);
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let mut session = session();
        let mut dispatchers = ActionRecorder::new().dispatchers();
        let err = replay("{not json\n".as_bytes(), &mut session, &mut dispatchers).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_empty_recording_is_an_error() {
        let mut session = session();
        let mut dispatchers = ActionRecorder::new().dispatchers();
        assert!(replay("\n# nothing\n".as_bytes(), &mut session, &mut dispatchers).is_err());
    }
}
