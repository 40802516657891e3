//! Async monitor service
//!
//! A single tokio task owns the [`MonitoringSession`]. Facial frames,
//! motion samples and control commands arrive over separate channels, so
//! the two sample streams never touch session state concurrently. Between
//! samples the task sleeps until the next timer deadline.

use dms::{FaceMetrics, LandmarkSample, MonitorConfig};
use intervention::{Action, Dispatchers};
use kinematics::MotionSample;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::session::{MonitoringSession, SessionError};
use crate::summary::TripSummary;

const CHANNEL_CAPACITY: usize = 100;

/// One facial observation
#[derive(Debug, Clone)]
pub enum FaceInput {
    Landmarks(LandmarkSample),
    Metrics { metrics: FaceMetrics, timestamp_ms: u64 },
    NoFace { timestamp_ms: u64 },
}

/// Commands to a running service
#[derive(Debug)]
pub enum Control {
    SetConfig(MonitorConfig),
    PlayMusic,
    PauseMusic,
    TestMessage,
    Stop {
        reply: oneshot::Sender<Result<TripSummary, SessionError>>,
    },
}

/// Runs a session against live input streams
pub struct MonitorService {
    session: MonitoringSession,
    dispatchers: Dispatchers,
    epoch: Instant,
}

impl MonitorService {
    /// Engine time is measured in milliseconds since `epoch`
    pub fn new(session: MonitoringSession, dispatchers: Dispatchers, epoch: Instant) -> Self {
        Self {
            session,
            dispatchers,
            epoch,
        }
    }

    /// Start monitoring and spawn the service task
    pub fn spawn(mut self) -> Result<MonitorHandle, SessionError> {
        let actions = self.session.start(self.now_ms())?;
        self.dispatch(&actions);

        let (face_tx, face_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (motion_tx, motion_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (control_tx, control_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let epoch = self.epoch;

        info!("Monitor service started");
        let task = tokio::spawn(self.run(face_rx, motion_rx, control_rx));

        Ok(MonitorHandle {
            faces: face_tx,
            motion: motion_tx,
            control: control_tx,
            task,
            epoch,
        })
    }

    async fn run(
        mut self,
        mut faces: mpsc::Receiver<FaceInput>,
        mut motion: mpsc::Receiver<MotionSample>,
        mut control: mpsc::Receiver<Control>,
    ) -> MonitoringSession {
        loop {
            let deadline = self
                .session
                .next_deadline()
                .map(|ms| self.epoch + Duration::from_millis(ms));

            // Pending samples are handled before timers and commands
            tokio::select! {
                biased;

                Some(input) = faces.recv() => self.handle_face(input),
                Some(sample) = motion.recv() => {
                    let result = self.session.process_motion(&sample);
                    self.dispatch_result(result);
                }
                _ = wait_until(deadline) => {
                    let actions = self.session.advance(self.now_ms());
                    self.dispatch(&actions);
                }
                command = control.recv() => match command {
                    Some(Control::Stop { reply }) => {
                        let result = self.stop();
                        if reply.send(result).is_err() {
                            debug!("Stop requester went away");
                        }
                        break;
                    }
                    Some(command) => self.handle_control(command),
                    None => {
                        info!("Control channel closed, stopping");
                        if let Err(e) = self.stop() {
                            warn!("Stop failed: {}", e);
                        }
                        break;
                    }
                },
            }
        }

        info!("Monitor service stopped");
        self.session
    }

    fn handle_face(&mut self, input: FaceInput) {
        let result = match input {
            FaceInput::Landmarks(sample) => self.session.process_face(&sample),
            FaceInput::Metrics {
                metrics,
                timestamp_ms,
            } => self.session.process_metrics(metrics, timestamp_ms),
            FaceInput::NoFace { timestamp_ms } => self.session.process_no_face(timestamp_ms),
        };
        self.dispatch_result(result);
    }

    fn handle_control(&mut self, command: Control) {
        let now_ms = self.now_ms();
        let result = match command {
            Control::SetConfig(config) => {
                if let Err(e) = self.session.set_config(config) {
                    warn!("Rejected configuration: {}", e);
                }
                Ok(Vec::new())
            }
            Control::PlayMusic => self.session.play_music_user(now_ms),
            Control::PauseMusic => self.session.pause_music_user(now_ms),
            Control::TestMessage => self.session.test_message(now_ms),
            Control::Stop { .. } => Ok(Vec::new()),
        };
        match result {
            Ok(actions) => self.dispatch(&actions),
            Err(e) => warn!("Command rejected: {}", e),
        }
    }

    fn stop(&mut self) -> Result<TripSummary, SessionError> {
        let (summary, actions) = self.session.stop(self.now_ms())?;
        self.dispatch(&actions);
        Ok(summary)
    }

    fn dispatch_result(&mut self, result: Result<Vec<Action>, SessionError>) {
        match result {
            Ok(actions) => self.dispatch(&actions),
            Err(e) => warn!("Sample rejected: {}", e),
        }
    }

    fn dispatch(&mut self, actions: &[Action]) {
        self.dispatchers.dispatch_all(actions);
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Handle to a running [`MonitorService`]
pub struct MonitorHandle {
    faces: mpsc::Sender<FaceInput>,
    motion: mpsc::Sender<MotionSample>,
    control: mpsc::Sender<Control>,
    task: JoinHandle<MonitoringSession>,
    epoch: Instant,
}

impl MonitorHandle {
    /// Milliseconds since the service epoch
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub async fn send_face(&self, input: FaceInput) -> Result<(), SessionError> {
        self.faces
            .send(input)
            .await
            .map_err(|_| SessionError::ServiceClosed)
    }

    pub async fn send_motion(&self, sample: MotionSample) -> Result<(), SessionError> {
        self.motion
            .send(sample)
            .await
            .map_err(|_| SessionError::ServiceClosed)
    }

    pub async fn send_control(&self, command: Control) -> Result<(), SessionError> {
        self.control
            .send(command)
            .await
            .map_err(|_| SessionError::ServiceClosed)
    }

    /// Sender for a motion source running on its own task
    pub fn motion_sender(&self) -> mpsc::Sender<MotionSample> {
        self.motion.clone()
    }

    /// Stop monitoring and wait for the service task to finish.
    ///
    /// No timer fires after this returns.
    pub async fn stop(self) -> Result<TripSummary, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send_control(Control::Stop { reply }).await?;
        let summary = response.await.map_err(|_| SessionError::ServiceClosed)?;

        if let Err(e) = self.task.await {
            warn!("Monitor task ended abnormally: {}", e);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::HeadPose;
    use intervention::{ActionRecorder, MessagePicker, Tone};
    use kinematics::KinematicConfig;

    fn service(recorder: &ActionRecorder) -> MonitorHandle {
        let session = MonitoringSession::with_parts(
            MonitorConfig::default(),
            KinematicConfig::default(),
            MessagePicker::seeded(11),
        )
        .unwrap();
        MonitorService::new(session, recorder.dispatchers(), Instant::now())
            .spawn()
            .unwrap()
    }

    fn eyes(ear: f64, timestamp_ms: u64) -> FaceInput {
        FaceInput::Metrics {
            metrics: FaceMetrics::from_values(ear, ear, 0.2, HeadPose::Centered),
            timestamp_ms,
        }
    }

    fn sleep_tones(recorder: &ActionRecorder) -> usize {
        recorder
            .actions()
            .iter()
            .filter(|action| **action == Action::PlayTone(Tone::SLEEP))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_between_samples() {
        let recorder = ActionRecorder::new();
        let handle = service(&recorder);

        handle.send_face(eyes(0.1, 0)).await.unwrap();
        time::sleep(Duration::from_millis(3_000)).await;
        handle.send_face(eyes(0.1, handle.now_ms())).await.unwrap();

        time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(sleep_tones(&recorder), 2);

        let summary = handle.stop().await.unwrap();
        assert_eq!(summary.sleep_episodes, 1);
        assert_eq!(summary.safety_score, 98);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tones_after_stop() {
        let recorder = ActionRecorder::new();
        let handle = service(&recorder);

        handle.send_face(eyes(0.1, 0)).await.unwrap();
        time::sleep(Duration::from_millis(3_000)).await;
        handle.send_face(eyes(0.1, handle.now_ms())).await.unwrap();
        time::sleep(Duration::from_millis(100)).await;

        handle.stop().await.unwrap();
        let tones = sleep_tones(&recorder);
        time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(sleep_tones(&recorder), tones);
    }

    #[tokio::test(start_paused = true)]
    async fn test_motion_and_controls() {
        let recorder = ActionRecorder::new();
        let handle = service(&recorder);

        handle
            .send_motion(MotionSample {
                timestamp_ms: 10,
                accel_x: 20.0,
                accel_z: 9.8,
                ..Default::default()
            })
            .await
            .unwrap();
        handle.send_control(Control::PlayMusic).await.unwrap();

        let summary = handle.stop().await.unwrap();
        assert_eq!(summary.motion_events, 1);
        assert_eq!(summary.safety_score, 95);

        let actions = recorder.actions();
        assert!(actions.contains(&Action::StartMusic));
        // Stopping pauses music
        assert_eq!(actions.last().map(|a| matches!(a, Action::Alert(_))), Some(true));
        assert!(actions.contains(&Action::PauseMusic));
    }
}
