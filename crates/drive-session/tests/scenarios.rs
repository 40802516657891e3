//! End-to-end driving scenarios through a monitoring session

use alerting::Severity;
use dms::landmarks::{
    Landmark, LandmarkSample, CHIN, LANDMARK_COUNT, LEFT_EYE_INDICES, MOUTH_CORNERS,
    MOUTH_VERTICAL_PAIRS, NOSE_TIP, RIGHT_EYE_INDICES,
};
use dms::{DriverStatus, MonitorConfig};
use drive_session::{MonitoringSession, SessionError, TimerKind};
use intervention::{Action, MessagePicker, Tone};
use kinematics::{KinematicConfig, MotionSample};

/// Synthetic face mesh with the given eye and mouth openness
fn face(ear: f64, mar: f64, nose_x: f64, timestamp_ms: u64) -> LandmarkSample {
    let mut points = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];

    for (indices, cx) in [(RIGHT_EYE_INDICES, 0.4), (LEFT_EYE_INDICES, 0.6)] {
        let half = ear * 0.1 / 2.0;
        points[indices[0]] = Landmark::new(cx - 0.05, 0.4, 0.0);
        points[indices[3]] = Landmark::new(cx + 0.05, 0.4, 0.0);
        points[indices[1]] = Landmark::new(cx - 0.02, 0.4 - half, 0.0);
        points[indices[5]] = Landmark::new(cx - 0.02, 0.4 + half, 0.0);
        points[indices[2]] = Landmark::new(cx + 0.02, 0.4 - half, 0.0);
        points[indices[4]] = Landmark::new(cx + 0.02, 0.4 + half, 0.0);
    }

    points[MOUTH_CORNERS.0] = Landmark::new(0.45, 0.65, 0.0);
    points[MOUTH_CORNERS.1] = Landmark::new(0.55, 0.65, 0.0);
    for (i, &(top, bottom)) in MOUTH_VERTICAL_PAIRS.iter().enumerate() {
        let x = 0.48 + 0.02 * i as f64;
        points[top] = Landmark::new(x, 0.65 - mar * 0.05, 0.0);
        points[bottom] = Landmark::new(x, 0.65 + mar * 0.05, 0.0);
    }

    points[NOSE_TIP] = Landmark::new(nose_x, 0.5, 0.0);
    points[CHIN] = Landmark::new(0.5, 0.8, 0.0);

    LandmarkSample::new(timestamp_ms, points).unwrap()
}

fn eyes(ear: f64, timestamp_ms: u64) -> LandmarkSample {
    face(ear, 0.2, 0.5, timestamp_ms)
}

fn session() -> MonitoringSession {
    let mut session = MonitoringSession::with_parts(
        MonitorConfig::default(),
        KinematicConfig::default(),
        MessagePicker::seeded(2024),
    )
    .unwrap();
    session.start(0).unwrap();
    session
}

fn alerts<'a>(actions: &'a [Action], needle: &'a str) -> impl Iterator<Item = Severity> + 'a {
    actions.iter().filter_map(move |action| match action {
        Action::Alert(entry) if entry.message.contains(needle) => Some(entry.severity),
        _ => None,
    })
}

/// Hold the eyes closed from `from_ms` for `closed_ms`
fn close_eyes(session: &mut MonitoringSession, from_ms: u64, closed_ms: u64) -> Vec<Action> {
    let mut actions = Vec::new();
    for t in (from_ms..=from_ms + closed_ms).step_by(100) {
        actions.extend(session.process_face(&eyes(0.15, t)).unwrap());
    }
    actions
}

#[test]
fn sustained_closure_enters_sleeping_once() {
    let mut session = session();
    let mut onsets = Vec::new();

    for t in (0..=3_500).step_by(100) {
        let actions = session.process_face(&eyes(0.15, t)).unwrap();
        if alerts(&actions, "SLEEPING DETECTED").count() > 0 {
            onsets.push(t);
        }
    }

    assert_eq!(onsets, vec![3_000]);
    assert_eq!(session.episode_count(), 1);
    assert!(session.continuous_alert_active());
    assert_eq!(session.status(), DriverStatus::Sleeping);
}

#[test]
fn reopening_eyes_stops_alert_within_one_sample() {
    let mut session = session();
    close_eyes(&mut session, 0, 3_500);
    assert!(session.timers().is_scheduled(TimerKind::ContinuousAlert));

    let actions = session.process_face(&eyes(0.3, 3_600)).unwrap();
    assert!(!session.continuous_alert_active());
    assert!(!session.timers().is_scheduled(TimerKind::ContinuousAlert));
    assert_eq!(alerts(&actions, "awake").collect::<Vec<_>>(), vec![Severity::Warning]);
    assert_eq!(session.fatigue_score(), 0.0);
}

#[test]
fn third_episode_hands_over_to_music() {
    let mut session = session();

    // Sleeping entered at 3 s, 8 s and 13 s
    close_eyes(&mut session, 0, 3_000);
    session.process_face(&eyes(0.3, 4_000)).unwrap();
    close_eyes(&mut session, 5_000, 3_000);
    session.process_face(&eyes(0.3, 9_000)).unwrap();
    assert_eq!(session.episode_count(), 2);
    assert!(!session.music().is_playing());

    let actions = close_eyes(&mut session, 10_000, 3_000);
    assert_eq!(session.episode_count(), 3);
    assert!(!session.continuous_alert_active());
    assert!(!session.timers().is_scheduled(TimerKind::ContinuousAlert));
    assert!(session.music().is_playing());
    assert!(actions.contains(&Action::StartMusic));
    assert_eq!(
        alerts(&actions, "Starting energetic music").collect::<Vec<_>>(),
        vec![Severity::Danger]
    );
}

#[test]
fn quick_relapse_is_not_a_new_episode() {
    let mut session = session();
    close_eyes(&mut session, 0, 3_000);
    session.process_face(&eyes(0.3, 3_100)).unwrap();

    // Asleep again 600 ms after the first onset
    session.process_face(&eyes(0.15, 3_200)).unwrap();
    session
        .set_config(MonitorConfig {
            wait_time_s: 0.4,
            ..Default::default()
        })
        .unwrap();
    session.process_face(&eyes(0.15, 3_600)).unwrap();

    assert_eq!(session.status(), DriverStatus::Sleeping);
    assert_eq!(session.episode_count(), 1);
}

#[test]
fn recovery_window_resets_episodes_and_music() {
    let mut session = session();
    close_eyes(&mut session, 0, 3_000);
    session.process_face(&eyes(0.3, 4_000)).unwrap();
    close_eyes(&mut session, 5_000, 3_000);
    session.process_face(&eyes(0.3, 9_000)).unwrap();
    close_eyes(&mut session, 10_000, 3_000);
    session.process_face(&eyes(0.3, 14_000)).unwrap();
    assert!(session.music().is_playing());

    let actions = session.advance(44_000);
    assert_eq!(session.episode_count(), 0);
    assert!(!session.music().is_playing());
    assert!(actions.contains(&Action::PauseMusic));
    assert_eq!(alerts(&actions, "Music stopped").count(), 1);
}

#[test]
fn brief_glance_away_raises_one_alert() {
    let mut session = session();
    let mut distraction_alerts = 0;

    for t in (0..=500).step_by(100) {
        let actions = session.process_face(&face(0.3, 0.2, 0.8, t)).unwrap();
        distraction_alerts += alerts(&actions, "distracted").count();
        assert_eq!(session.fatigue_score(), 15.0);
    }
    session.process_face(&face(0.3, 0.2, 0.5, 600)).unwrap();

    assert_eq!(distraction_alerts, 1);
    assert_eq!(session.fatigue_score(), 0.0);
    assert_eq!(session.safety_score(), 98);
}

#[test]
fn distraction_tag_expires_after_ttl() {
    let mut session = session();
    let away = |t| face(0.3, 0.2, 0.8, t);

    let first = session.process_face(&away(1_000)).unwrap();
    assert_eq!(alerts(&first, "distracted").count(), 1);

    let early = session.process_face(&away(3_999)).unwrap();
    assert_eq!(alerts(&early, "distracted").count(), 0);

    let late = session.process_face(&away(4_001)).unwrap();
    assert_eq!(alerts(&late, "distracted").count(), 1);
    assert!(late.contains(&Action::PlayTone(Tone::DISTRACTION)));
}

#[test]
fn repeated_acceleration_is_debounced() {
    let mut session = session();
    let surge = |t| MotionSample {
        timestamp_ms: t,
        accel_x: 20.0,
        accel_z: 9.8,
        ..Default::default()
    };

    let first = session.process_motion(&surge(1_000)).unwrap();
    let second = session.process_motion(&surge(2_000)).unwrap();

    assert_eq!(alerts(&first, "Rapid Acceleration").count(), 1);
    assert!(second.is_empty());
    assert_eq!(session.recent_motion_events().len(), 1);
    assert_eq!(session.safety_score(), 95);
}

#[test]
fn long_sleep_floors_safety_score() {
    let mut session = session();
    close_eyes(&mut session, 0, 20_000);

    assert_eq!(session.safety_score(), 0);
    assert_eq!(session.episode_count(), 1);
}

#[test]
fn no_face_is_not_an_error() {
    let mut session = session();
    close_eyes(&mut session, 0, 3_500);

    let actions = session.process_no_face(3_600).unwrap();
    assert!(actions.is_empty());
    assert_eq!(session.status(), DriverStatus::NoFace);
    assert!(!session.continuous_alert_active());
    assert_eq!(session.episode_count(), 1);
    assert!(!session.timers().is_scheduled(TimerKind::Recovery));
}

#[test]
fn malformed_landmarks_are_rejected() {
    let mut session = session();
    let collapsed = LandmarkSample::new(0, vec![Landmark::default(); LANDMARK_COUNT]).unwrap();

    assert!(matches!(
        session.process_face(&collapsed),
        Err(SessionError::Dms(_))
    ));
    assert!(session.last_analysis().is_none());
}

#[test]
fn alert_log_keeps_latest_entries() {
    let mut session = session();
    for i in 0..6u64 {
        let t = 1_000 + i * 3_000;
        session
            .process_motion(&MotionSample {
                timestamp_ms: t,
                accel_x: -20.0,
                ..Default::default()
            })
            .unwrap();
    }

    let log = session.alert_log();
    assert_eq!(log.len(), 7);
    assert_eq!(log.latest().map(|entry| entry.timestamp_ms), Some(16_000));
    assert_eq!(session.safety_score(), 40);
}
