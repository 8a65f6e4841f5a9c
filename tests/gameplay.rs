//! End-to-end checks through the public API: level files, full sessions,
//! and the threaded scheduler.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use brickfall::consts::SIM_DT;
use brickfall::level::LevelError;
use brickfall::sim::{EntityKind, ObjectiveStatus};
use brickfall::{
    FrameSnapshot, GameplaySession, Key, LevelCatalog, LevelSchema, Scheduler, SchedulerConfig,
    SessionCommand, SessionConfig, SessionEvent, SessionPhase, TickInput,
};

const WALL_LEVEL: &str = r#"{
    "id": "wall",
    "displayName": "The Wall",
    "board": { "columns": 3, "rows": 2 },
    "constraints": { "moveLimit": 5 },
    "bricks": [
        { "column": 0, "row": 0, "brickType": "steel", "hitPoints": 2, "tags": ["steel"] },
        { "column": 1, "row": 0 },
        { "column": 2, "row": 0, "tags": ["gold"] },
        { "column": 1, "row": 1, "hitPoints": 3, "modifiers": ["armored"] }
    ],
    "objectives": [
        { "id": "gold", "type": "clear-tagged-bricks",
          "target": { "amount": 1, "trackedTags": ["gold"] } },
        { "id": "rush", "type": "score", "optional": true,
          "target": { "amount": 5000, "timeLimitSeconds": 1.0 } }
    ]
}"#;

/// Chase the lowest ball, launch whenever serving
fn autopilot(session: &GameplaySession) -> TickInput {
    let mut input = TickInput::default();
    if session.is_awaiting_launch() {
        return input.press(Key::Launch);
    }
    let paddle = session.paddle();
    let center = paddle.center_x();
    let lowest = session
        .balls()
        .iter()
        .max_by(|a, b| a.body.pos.y.total_cmp(&b.body.pos.y));
    if let Some(ball) = lowest {
        let x = ball.body.center().x;
        if x < center - 8.0 {
            input = input.hold(Key::MoveLeft);
        } else if x > center + 8.0 {
            input = input.hold(Key::MoveRight);
        }
    }
    input
}

fn wall_session(seed: u64) -> GameplaySession {
    let level = LevelSchema::from_json(WALL_LEVEL).unwrap();
    let catalog = LevelCatalog::new(vec![level]).unwrap();
    let mut session = GameplaySession::new(SessionConfig::default().with_seed(seed), catalog).unwrap();
    session.begin_new_session();
    session
}

#[test]
fn level_file_drives_layout_and_objectives() {
    let session = wall_session(1);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.level_name, "The Wall");
    assert_eq!(snapshot.count(EntityKind::Brick), 4);
    assert_eq!(snapshot.objectives.len(), 2);
    assert_eq!(snapshot.objectives[1].time_remaining, Some(1.0));

    let armored = &session.bricks()[3];
    assert_eq!(armored.modifiers, vec!["armored".to_string()]);
    assert_eq!(armored.score_value, 150);
    assert_eq!(session.level().constraints.move_limit, Some(5));
}

#[test]
fn optional_timer_fails_without_ending_level() {
    let mut session = wall_session(1);
    for _ in 0..90 {
        session.update(&TickInput::default(), SIM_DT);
    }
    let objectives = session.objectives().snapshot();
    assert_eq!(objectives[1].status, ObjectiveStatus::Failed);
    assert_eq!(objectives[0].status, ObjectiveStatus::InProgress);
    assert_eq!(session.phase(), SessionPhase::Serve);
    let failures = session
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::Objective(_)))
        .count();
    assert_eq!(failures, 1);
}

#[test]
fn broken_level_files_are_rejected() {
    let duplicate = r#"{ "id": "dup", "board": { "columns": 2, "rows": 1 },
        "bricks": [ { "column": 0, "row": 0 }, { "column": 0, "row": 0 } ] }"#;
    assert!(matches!(
        LevelSchema::from_json(duplicate),
        Err(LevelError::DuplicateBrick { .. })
    ));

    let unknown = r#"{ "id": "odd", "board": { "columns": 1, "rows": 1 },
        "objectives": [ { "id": "x", "type": "collect-stars", "target": { "amount": 1 } } ] }"#;
    assert!(matches!(
        LevelSchema::from_json(unknown),
        Err(LevelError::UnknownObjectiveType { .. })
    ));
}

#[test]
fn identical_inputs_give_identical_frames() {
    let play = |seed: u64| {
        let config = SessionConfig::default().with_seed(seed);
        let mut session = GameplaySession::new(config, LevelCatalog::builtin()).unwrap();
        session.begin_new_session();
        let mut frames: Vec<FrameSnapshot> = Vec::new();
        for step in 0..3000 {
            let input = autopilot(&session);
            session.update(&input, SIM_DT);
            if step % 100 == 0 {
                frames.push(session.snapshot());
            }
        }
        frames
    };
    assert_eq!(play(7), play(7));
}

#[test]
fn autopilot_run_keeps_invariants() {
    let config = SessionConfig {
        drop_chance: 0.3,
        ..SessionConfig::default()
    };
    let mut session = GameplaySession::new(config, LevelCatalog::builtin()).unwrap();
    session.begin_new_session();
    let mut last_score = 0;

    for _ in 0..6000 {
        let input = autopilot(&session);
        session.update(&input, SIM_DT);

        assert!(session.score() >= last_score);
        last_score = session.score();
        assert!(session.lives() <= session.config().max_lives);
        assert!(session.balls().len() <= session.config().max_balls);
        for ball in session.balls() {
            assert!(ball.body.pos.x >= session.arena().left);
            assert!(ball.body.pos.x + ball.body.width <= session.arena().right);
        }
        for state in session.objectives().snapshot() {
            assert!(state.progress <= state.target);
        }
        if session.phase().is_terminal() {
            break;
        }
    }
    assert!(session.time_ticks() > 0);
}

#[test]
fn scheduler_plays_and_reports_events() {
    let config = SessionConfig::default().with_seed(3);
    let mut session = GameplaySession::new(config, LevelCatalog::builtin()).unwrap();
    session.begin_new_session();

    let seen: Arc<Mutex<Vec<SessionEvent>>> = Arc::default();
    let record = Arc::clone(&seen);
    let sink = move |_frame: &FrameSnapshot, events: &[SessionEvent]| {
        record.lock().unwrap().extend_from_slice(events);
    };
    let scheduler_config = SchedulerConfig {
        target_rate: 120,
        ..SchedulerConfig::default()
    };
    let mut scheduler = Scheduler::new(scheduler_config, session, Box::new(sink)).unwrap();
    let input = scheduler.input();
    scheduler.start().unwrap();

    input.tap(Key::Launch);
    thread::sleep(Duration::from_millis(150));
    scheduler.send(SessionCommand::Pause);
    thread::sleep(Duration::from_millis(50));
    let session = scheduler.into_session().unwrap();

    let events = seen.lock().unwrap();
    let launches = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::BallLaunched { .. }))
        .count();
    assert_eq!(launches, 1);
    assert!(events.contains(&SessionEvent::Paused));
    assert!(session.is_paused());
    assert_eq!(session.phase(), SessionPhase::Playing);
}

#[test]
fn snapshot_serializes_for_sinks() {
    let session = wall_session(1);
    let json = session.snapshot().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["levelId"], "wall");
    assert_eq!(value["phase"], "serve");
    assert_eq!(value["lives"], 3);
    assert!(value["entities"].as_array().unwrap().len() >= 6);
    assert_eq!(value["objectives"][0]["status"], "in-progress");
}
