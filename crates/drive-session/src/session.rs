//! Monitoring session
//!
//! Owns all per-trip state and applies the escalation rules to every
//! facial and motion sample. Engine time is the millisecond timestamp
//! carried on the samples; it never runs backwards within a session.

use alerting::{AlertLog, AlertTagRegistry, Severity, ALERT_LOG_CAPACITY};
use chrono::{DateTime, Utc};
use dms::{
    ConfigError, DmsAnalysis, DmsError, DmsEvent, DmsModule, DriverStatus, DrowsinessEvent,
    DrowsinessPhase, FaceMetrics, LandmarkSample, MonitorConfig,
};
use intervention::{
    Action, ActionBuffer, EscalationPolicy, MessagePicker, MusicController, PlayRequest,
    SafetyLedger, Tone,
};
use kinematics::{KinematicConfig, KinematicDetector, KinematicsError, MotionEvent, MotionSample};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::summary::TripSummary;
use crate::timers::{ScheduledTimer, TimerKind, TimerQueue};

/// Safety points lost per sleeping frame
const SLEEPING_COST: u32 = 2;

/// Safety points lost per distraction alert
const DISTRACTION_COST: u32 = 2;

/// Session error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Monitoring is not running")]
    NotMonitoring,

    #[error("Monitoring is already running")]
    AlreadyMonitoring,

    #[error("Face analysis failed: {0}")]
    Dms(#[from] DmsError),

    #[error("Motion sample rejected: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Monitor service has shut down")]
    ServiceClosed,
}

/// Per-trip monitoring state
pub struct MonitoringSession {
    config: MonitorConfig,
    dms: DmsModule,
    kinematics: KinematicDetector,
    tags: AlertTagRegistry,
    music: MusicController,
    policy: EscalationPolicy,
    ledger: SafetyLedger,
    alert_log: AlertLog,
    timers: TimerQueue,

    monitoring: bool,
    generation: u64,
    clock_ms: u64,
    started_ms: u64,
    trip_id: Uuid,
    started_at: DateTime<Utc>,
    sleep_episodes: u32,
    motion_events: u32,

    last_analysis: Option<DmsAnalysis>,
    last_motion: Option<MotionSample>,
}

impl MonitoringSession {
    pub fn new(config: MonitorConfig) -> Result<Self, SessionError> {
        Self::with_parts(config, KinematicConfig::default(), MessagePicker::new())
    }

    /// Session with explicit motion thresholds and message source
    pub fn with_parts(
        config: MonitorConfig,
        kinematics: KinematicConfig,
        picker: MessagePicker,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        kinematics.validate()?;
        Ok(Self {
            config,
            dms: DmsModule::new(),
            kinematics: KinematicDetector::new(kinematics),
            tags: AlertTagRegistry::new(),
            music: MusicController::new(),
            policy: EscalationPolicy::new(picker),
            ledger: SafetyLedger::new(),
            alert_log: AlertLog::new(ALERT_LOG_CAPACITY),
            timers: TimerQueue::new(),
            monitoring: false,
            generation: 0,
            clock_ms: 0,
            started_ms: 0,
            trip_id: Uuid::nil(),
            started_at: Utc::now(),
            sleep_episodes: 0,
            motion_events: 0,
            last_analysis: None,
            last_motion: None,
        })
    }

    /// Start a trip at `now_ms`, resetting all per-trip state
    pub fn start(&mut self, now_ms: u64) -> Result<Vec<Action>, SessionError> {
        if self.monitoring {
            return Err(SessionError::AlreadyMonitoring);
        }

        self.generation += 1;
        self.dms.reset_state();
        self.kinematics.reset();
        self.tags.clear();
        self.ledger.reset();
        self.music.reset();
        self.timers.clear();
        self.monitoring = true;
        self.clock_ms = now_ms;
        self.started_ms = now_ms;
        self.trip_id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.sleep_episodes = 0;
        self.motion_events = 0;
        self.last_analysis = None;
        self.last_motion = None;

        info!("Monitoring started (trip {}, generation {})", self.trip_id, self.generation);
        metrics::gauge!("drivesense_safety_score").set(self.ledger.score() as f64);

        let mut out = ActionBuffer::new(now_ms, &self.config);
        out.alert("Full system monitoring started!", Severity::Safe);
        Ok(self.commit(out))
    }

    /// End the trip. All timers are dropped before this returns.
    pub fn stop(&mut self, now_ms: u64) -> Result<(TripSummary, Vec<Action>), SessionError> {
        self.ensure_monitoring()?;
        let now_ms = self.tick(now_ms);

        self.timers.clear();
        self.generation += 1;
        self.monitoring = false;
        self.dms.face_lost(now_ms);

        let mut summary = TripSummary::new(
            self.trip_id,
            self.started_at,
            now_ms.saturating_sub(self.started_ms),
        );
        summary.safety_score = self.ledger.score();
        summary.interventions = self.ledger.interventions();
        summary.sleep_episodes = self.sleep_episodes;
        summary.motion_events = self.motion_events;

        info!(
            "Monitoring stopped after {} (score {}, {} interventions)",
            summary.duration_hms(),
            summary.safety_score,
            summary.interventions
        );

        let mut out = ActionBuffer::new(now_ms, &self.config);
        out.extend(self.music.pause());
        out.alert("Monitoring stopped", Severity::Safe);
        out.alert(summary.to_string(), Severity::Safe);
        Ok((summary, self.commit(out)))
    }

    /// Replace the live configuration
    pub fn set_config(&mut self, config: MonitorConfig) -> Result<(), SessionError> {
        config.validate()?;
        debug!("Configuration updated: {:?}", config);
        self.config = config;
        Ok(())
    }

    /// Process one facial landmark frame
    pub fn process_face(&mut self, sample: &LandmarkSample) -> Result<Vec<Action>, SessionError> {
        self.ensure_monitoring()?;
        let metrics = FaceMetrics::extract(sample)?;
        self.process_metrics(metrics, sample.timestamp_ms)
    }

    /// Process facial metrics computed elsewhere
    pub fn process_metrics(
        &mut self,
        metrics: FaceMetrics,
        timestamp_ms: u64,
    ) -> Result<Vec<Action>, SessionError> {
        self.ensure_monitoring()?;
        metrics.validate()?;
        let now_ms = self.tick(timestamp_ms);
        let mut out = ActionBuffer::new(now_ms, &self.config);
        self.fire_due_timers(now_ms, &mut out);

        let analysis = self
            .dms
            .analyze_metrics(metrics, now_ms, &self.config, &mut self.tags);
        self.apply_face_events(&analysis, &mut out);

        if analysis.phase() == DrowsinessPhase::Sleeping {
            self.ledger.deduct(SLEEPING_COST);
            self.record_intervention();
        }

        let fatigue = analysis.fatigue_score();
        metrics::gauge!("drivesense_fatigue_score").set(fatigue);
        self.policy
            .on_fatigue(fatigue, &self.config, &mut self.tags, &mut self.music, &mut out);

        self.last_analysis = Some(analysis);
        Ok(self.commit(out))
    }

    /// No face in the frame at `timestamp_ms`
    pub fn process_no_face(&mut self, timestamp_ms: u64) -> Result<Vec<Action>, SessionError> {
        self.ensure_monitoring()?;
        let now_ms = self.tick(timestamp_ms);
        let mut out = ActionBuffer::new(now_ms, &self.config);
        self.fire_due_timers(now_ms, &mut out);

        let analysis = self.dms.face_lost(now_ms);
        self.apply_face_events(&analysis, &mut out);

        self.last_analysis = Some(analysis);
        Ok(self.commit(out))
    }

    /// Process one motion sample
    pub fn process_motion(&mut self, sample: &MotionSample) -> Result<Vec<Action>, SessionError> {
        self.ensure_monitoring()?;
        sample.validate()?;
        let now_ms = self.tick(sample.timestamp_ms);
        let mut out = ActionBuffer::new(now_ms, &self.config);
        self.fire_due_timers(now_ms, &mut out);

        let sample = MotionSample {
            timestamp_ms: now_ms,
            ..*sample
        };
        if let Some(event) = self.kinematics.process(&sample)? {
            self.apply_motion_event(&event, &mut out);
        }

        self.last_motion = Some(sample);
        Ok(self.commit(out))
    }

    /// Advance engine time without a sample, firing due timers
    pub fn advance(&mut self, now_ms: u64) -> Vec<Action> {
        if !self.monitoring {
            return Vec::new();
        }
        let now_ms = self.tick(now_ms);
        let mut out = ActionBuffer::new(now_ms, &self.config);
        self.fire_due_timers(now_ms, &mut out);
        self.commit(out)
    }

    /// Driver pressed play
    pub fn play_music_user(&mut self, now_ms: u64) -> Result<Vec<Action>, SessionError> {
        self.ensure_monitoring()?;
        let mut out = ActionBuffer::new(now_ms, &self.config);
        out.extend(self.music.play(PlayRequest::USER, self.episode_count()));
        Ok(self.commit(out))
    }

    /// Driver pressed pause
    pub fn pause_music_user(&mut self, now_ms: u64) -> Result<Vec<Action>, SessionError> {
        self.ensure_monitoring()?;
        let mut out = ActionBuffer::new(now_ms, &self.config);
        out.extend(self.music.pause());
        Ok(self.commit(out))
    }

    /// Speak a motivational message on request
    pub fn test_message(&mut self, now_ms: u64) -> Result<Vec<Action>, SessionError> {
        self.ensure_monitoring()?;
        let mut out = ActionBuffer::new(now_ms, &self.config);
        self.policy.test_message(&mut out);
        Ok(self.commit(out))
    }

    fn apply_face_events(&mut self, analysis: &DmsAnalysis, out: &mut ActionBuffer) {
        let now_ms = out.now_ms();

        for event in &analysis.events {
            match *event {
                DmsEvent::Drowsiness(DrowsinessEvent::SleepOnset {
                    episode_count,
                    counted,
                    continuous_alert,
                }) => {
                    if counted {
                        self.sleep_episodes += 1;
                        metrics::counter!("drivesense_sleep_episodes_total").increment(1);
                    }
                    self.timers.cancel(TimerKind::Recovery);

                    out.alert(
                        format!(
                            "SLEEPING DETECTED! Wake up immediately! (Episode {})",
                            episode_count
                        ),
                        Severity::Danger,
                    );
                    out.speak("Wake up! You are falling asleep while driving!");

                    if continuous_alert {
                        self.schedule(TimerKind::ContinuousAlert, now_ms);
                    }
                    if self
                        .policy
                        .escalate_episodes(episode_count, &mut self.music, out)
                    {
                        self.dms.drowsiness_mut().suppress_continuous_alert();
                        self.timers.cancel(TimerKind::ContinuousAlert);
                    }
                }
                DmsEvent::Drowsiness(DrowsinessEvent::Awake) => {
                    self.timers.cancel(TimerKind::ContinuousAlert);
                    out.alert("Driver awake again - Good!", Severity::Warning);
                    self.schedule(TimerKind::Recovery, now_ms);
                }
                DmsEvent::Drowsiness(DrowsinessEvent::FaceLost { was_sleeping }) => {
                    if was_sleeping {
                        debug!("Face lost while sleeping, stopping alert");
                    }
                    self.timers.cancel(TimerKind::ContinuousAlert);
                }
                DmsEvent::Drowsiness(DrowsinessEvent::EyesClosing) => {}
                DmsEvent::DistractionBeep(_) => out.tone(Tone::DISTRACTION),
                DmsEvent::Distraction(pose) => {
                    debug!("Distracted: {}", pose);
                    self.ledger.deduct(DISTRACTION_COST);
                    out.alert(
                        "Attention! You are distracted - Look at the road!",
                        Severity::Warning,
                    );
                }
                DmsEvent::Yawn { duration_s } => {
                    debug!("Yawn after {:.1}s", duration_s);
                    out.alert("Yawning detected! Consider a break.", Severity::Warning);
                    out.tone(Tone::YAWN);
                    self.record_intervention();
                }
            }
        }
    }

    fn apply_motion_event(&mut self, event: &MotionEvent, out: &mut ActionBuffer) {
        self.motion_events += 1;
        metrics::counter!("drivesense_motion_events_total").increment(1);
        self.ledger.deduct(event.cost());
        self.record_intervention();
        out.alert(event.to_string(), event.severity());
    }

    fn fire_due_timers(&mut self, now_ms: u64, out: &mut ActionBuffer) {
        while let Some(timer) = self.timers.pop_due(now_ms) {
            if timer.generation != self.generation {
                warn!(
                    "Dropping {:?} timer from generation {} (current {})",
                    timer.kind, timer.generation, self.generation
                );
                continue;
            }
            self.fire(timer, now_ms, out);
        }
    }

    fn fire(&mut self, timer: ScheduledTimer, now_ms: u64, out: &mut ActionBuffer) {
        match timer.kind {
            TimerKind::ContinuousAlert => {
                let drowsiness = self.dms.drowsiness();
                if !drowsiness.is_sleeping() || !drowsiness.continuous_alert_active() {
                    debug!("Continuous alert no longer needed");
                    return;
                }
                out.tone(Tone::SLEEP);
                if let Some(next_due) = timer.next_due(now_ms) {
                    self.timers
                        .schedule(TimerKind::ContinuousAlert, next_due, self.generation);
                }
            }
            TimerKind::Recovery => {
                if !self.dms.drowsiness_mut().complete_recovery() {
                    return;
                }
                if self.music.is_playing() {
                    out.extend(self.music.pause());
                    out.alert("Music stopped - Driver is alert", Severity::Warning);
                }
            }
        }
    }

    fn schedule(&mut self, kind: TimerKind, now_ms: u64) {
        self.timers.cancel(kind);
        self.timers
            .schedule(kind, now_ms + kind.delay_ms(), self.generation);
    }

    fn record_intervention(&mut self) {
        self.ledger.record_intervention();
        metrics::counter!("drivesense_interventions_total").increment(1);
    }

    /// Record alerts in the log and hand the actions back
    fn commit(&mut self, out: ActionBuffer) -> Vec<Action> {
        let actions = out.into_actions();
        for action in &actions {
            if let Action::Alert(entry) = action {
                self.alert_log.push(entry.clone());
            }
        }
        metrics::gauge!("drivesense_safety_score").set(self.ledger.score() as f64);
        actions
    }

    fn tick(&mut self, timestamp_ms: u64) -> u64 {
        if timestamp_ms < self.clock_ms {
            debug!(
                "Sample at {}ms is older than engine time {}ms",
                timestamp_ms, self.clock_ms
            );
        }
        self.clock_ms = self.clock_ms.max(timestamp_ms);
        self.clock_ms
    }

    fn ensure_monitoring(&self) -> Result<(), SessionError> {
        if self.monitoring {
            Ok(())
        } else {
            Err(SessionError::NotMonitoring)
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current engine time (milliseconds)
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn episode_count(&self) -> u32 {
        self.dms.drowsiness().episode_count()
    }

    pub fn continuous_alert_active(&self) -> bool {
        self.dms.drowsiness().continuous_alert_active()
    }

    pub fn safety_score(&self) -> u32 {
        self.ledger.score()
    }

    pub fn ledger(&self) -> &SafetyLedger {
        &self.ledger
    }

    pub fn music(&self) -> &MusicController {
        &self.music
    }

    pub fn alert_log(&self) -> &AlertLog {
        &self.alert_log
    }

    pub fn tags(&self) -> &AlertTagRegistry {
        &self.tags
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Due time of the next pending timer
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn last_analysis(&self) -> Option<&DmsAnalysis> {
        self.last_analysis.as_ref()
    }

    pub fn last_motion(&self) -> Option<&MotionSample> {
        self.last_motion.as_ref()
    }

    pub fn fatigue_score(&self) -> f64 {
        self.last_analysis
            .as_ref()
            .map(DmsAnalysis::fatigue_score)
            .unwrap_or(0.0)
    }

    pub fn status(&self) -> DriverStatus {
        self.last_analysis
            .as_ref()
            .map(|analysis| analysis.status)
            .unwrap_or_default()
    }

    pub fn recent_motion_events(&self) -> Vec<MotionEvent> {
        self.kinematics.recent_events()
    }
}
