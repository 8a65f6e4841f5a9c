//! Fixed timestep game loop
//!
//! [`FixedStep`] is the accumulator: wall-clock time goes in, whole fixed
//! steps come out, capped per iteration. [`Scheduler`] runs it on a
//! dedicated thread that owns the session, applies queued
//! [`SessionCommand`]s, and hands one snapshot per iteration to a
//! [`FrameSink`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::{ConfigError, SchedulerConfig};
use crate::input::{InputLatch, TickInput};
use crate::sim::{FrameSnapshot, GameplaySession, SessionEvent};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid scheduler config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn game loop thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("game loop thread panicked")]
    ThreadPanicked,

    #[error("session is owned by the running game loop or was lost")]
    SessionUnavailable,
}

/// Anything that can be advanced by fixed steps
pub trait Simulation {
    fn step(&mut self, input: &TickInput, dt: f32);
}

impl Simulation for GameplaySession {
    fn step(&mut self, input: &TickInput, dt: f32) {
        self.update(input, dt);
    }
}

/// Downstream consumer of per-iteration state (renderer, audio, recorder)
pub trait FrameSink: Send {
    /// Called once per iteration, after every step of that iteration ran
    fn present(&mut self, frame: &FrameSnapshot, events: &[SessionEvent]);
}

impl<F> FrameSink for F
where
    F: FnMut(&FrameSnapshot, &[SessionEvent]) + Send,
{
    fn present(&mut self, frame: &FrameSnapshot, events: &[SessionEvent]) {
        self(frame, events)
    }
}

/// Sink that drops everything
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &FrameSnapshot, _events: &[SessionEvent]) {}
}

/// Lifecycle requests for a session owned by the game loop thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    BeginNewSession,
    RestartLevel,
    Pause,
    Resume,
    EndSession,
}

impl SessionCommand {
    pub fn apply(self, session: &mut GameplaySession) {
        match self {
            SessionCommand::BeginNewSession => session.begin_new_session(),
            SessionCommand::RestartLevel => session.restart_level(),
            SessionCommand::Pause => session.pause_game(),
            SessionCommand::Resume => session.resume_from_pause(),
            SessionCommand::EndSession => session.end_session(),
        }
    }
}

/// Accumulator that converts elapsed time into fixed steps
#[derive(Debug, Clone)]
pub struct FixedStep {
    dt: f32,
    max_steps: u32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(dt: f32, max_steps: u32) -> Self {
        Self {
            dt,
            max_steps: max_steps.max(1),
            accumulator: 0.0,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.fixed_dt(), config.max_steps_per_iteration)
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Time banked but not yet simulated
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Bank `elapsed` seconds and drain whole steps into `sim`.
    ///
    /// `latch` is called at most once, and only when a step is due, so an
    /// input edge is never consumed by an iteration that simulates nothing.
    /// Edges reach the first step only. When the step cap is hit the backlog
    /// is dropped rather than carried over. Returns the number of steps run.
    pub fn run_iteration<S, L>(&mut self, elapsed: f32, sim: &mut S, latch: L) -> u32
    where
        S: Simulation + ?Sized,
        L: FnOnce() -> TickInput,
    {
        self.accumulator += elapsed.max(0.0);
        if self.accumulator < self.dt {
            return 0;
        }

        let mut input = latch();
        let mut steps = 0;
        while self.accumulator >= self.dt {
            if steps == self.max_steps {
                log::warn!(
                    "Game loop fell behind, dropping {:.3}s of simulation",
                    self.accumulator
                );
                self.accumulator = 0.0;
                break;
            }
            sim.step(&input, self.dt);
            input = input.without_edges();
            self.accumulator -= self.dt;
            steps += 1;
        }
        steps
    }
}

type LoopOutput = (GameplaySession, Box<dyn FrameSink>);

/// Runs a session on its own thread at a fixed rate
pub struct Scheduler {
    config: SchedulerConfig,
    input: InputLatch,
    running: Arc<AtomicBool>,
    /// Held here while stopped, moved into the thread while running
    session: Option<GameplaySession>,
    sink: Option<Box<dyn FrameSink>>,
    commands: Option<Sender<SessionCommand>>,
    handle: Option<JoinHandle<LoopOutput>>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        session: GameplaySession,
        sink: Box<dyn FrameSink>,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            config,
            input: InputLatch::new(),
            running: Arc::new(AtomicBool::new(false)),
            session: Some(session),
            sink: Some(sink),
            commands: None,
            handle: None,
        })
    }

    /// Use an existing latch instead of a fresh one
    pub fn with_input(mut self, input: InputLatch) -> Self {
        self.input = input;
        self
    }

    /// Handle for the input source to write key presses into
    pub fn input(&self) -> InputLatch {
        self.input.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Sender for lifecycle commands; `None` while stopped
    pub fn commands(&self) -> Option<Sender<SessionCommand>> {
        self.commands.clone()
    }

    /// Queue a command for the running loop, or apply it directly while
    /// stopped. Returns false when there is nobody to apply it to.
    pub fn send(&mut self, command: SessionCommand) -> bool {
        if let Some(tx) = &self.commands {
            return tx.send(command).is_ok();
        }
        match self.session.as_mut() {
            Some(session) => {
                command.apply(session);
                true
            }
            None => false,
        }
    }

    /// Session access while stopped
    pub fn session(&self) -> Option<&GameplaySession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut GameplaySession> {
        self.session.as_mut()
    }

    /// Spawn the game loop thread. Calling it while running does nothing.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.handle.is_some() {
            return Ok(());
        }
        let (mut session, mut sink) = match (self.session.take(), self.sink.take()) {
            (Some(session), Some(sink)) => (session, sink),
            (session, sink) => {
                self.session = session;
                self.sink = sink;
                return Err(SchedulerError::SessionUnavailable);
            }
        };

        let (tx, rx) = mpsc::channel();
        let config = self.config.clone();
        let input = self.input.clone();
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name("game-loop".to_string())
            .spawn(move || {
                run_loop(&config, &running, &input, &rx, &mut session, sink.as_mut());
                (session, sink)
            });
        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                self.commands = Some(tx);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(err.into())
            }
        }
    }

    /// Stop the loop and wait for it. The step in flight completes first.
    /// Calling it while stopped does nothing.
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        self.running.store(false, Ordering::Release);
        self.commands = None;
        let (session, sink) = handle.join().map_err(|_| SchedulerError::ThreadPanicked)?;
        self.session = Some(session);
        self.sink = Some(sink);
        Ok(())
    }

    /// Stop and hand back the session
    pub fn into_session(mut self) -> Result<GameplaySession, SchedulerError> {
        self.stop()?;
        self.session.take().ok_or(SchedulerError::SessionUnavailable)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("Game loop did not shut down cleanly: {}", err);
        }
    }
}

fn run_loop(
    config: &SchedulerConfig,
    running: &AtomicBool,
    input: &InputLatch,
    commands: &Receiver<SessionCommand>,
    session: &mut GameplaySession,
    sink: &mut dyn FrameSink,
) {
    let mut stepper = FixedStep::from_config(config);
    let idle = Duration::from_millis(config.idle_millis);
    let mut total_steps: u64 = 0;
    let mut last = Instant::now();
    log::info!("Game loop started at {} Hz", config.target_rate);

    while running.load(Ordering::Acquire) {
        for command in commands.try_iter() {
            log::debug!("Applying {:?}", command);
            command.apply(session);
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last).as_secs_f32();
        last = now;

        let steps = stepper.run_iteration(elapsed, session, || input.latch());
        total_steps += u64::from(steps);

        let events = session.drain_events();
        if steps > 0 || !events.is_empty() {
            sink.present(&session.snapshot(), &events);
        }

        if !idle.is_zero() {
            thread::sleep(idle);
        }
    }

    // Commands accepted before stop still land on the returned session
    for command in commands.try_iter() {
        log::debug!("Applying {:?} on shutdown", command);
        command.apply(session);
    }
    let events = session.drain_events();
    if !events.is_empty() {
        sink.present(&session.snapshot(), &events);
    }

    log::info!("Game loop stopped after {} steps", total_steps);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::input::Key;
    use crate::level::LevelCatalog;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        inputs: Vec<TickInput>,
        dts: Vec<f32>,
    }

    impl Simulation for Recorder {
        fn step(&mut self, input: &TickInput, dt: f32) {
            self.inputs.push(*input);
            self.dts.push(dt);
        }
    }

    #[test]
    fn test_drains_whole_steps_and_keeps_remainder() {
        let mut stepper = FixedStep::new(0.25, 5);
        let mut sim = Recorder::default();
        let steps = stepper.run_iteration(0.875, &mut sim, TickInput::default);
        assert_eq!(steps, 3);
        assert_eq!(sim.dts, vec![0.25; 3]);
        assert_eq!(stepper.accumulator(), 0.125);

        // Remainder carries into the next iteration
        assert_eq!(stepper.run_iteration(0.125, &mut sim, TickInput::default), 1);
        assert_eq!(stepper.accumulator(), 0.0);
    }

    #[test]
    fn test_cap_drops_backlog() {
        let mut stepper = FixedStep::new(0.25, 5);
        let mut sim = Recorder::default();
        assert_eq!(stepper.run_iteration(10.0, &mut sim, TickInput::default), 5);
        assert_eq!(stepper.accumulator(), 0.0);
    }

    #[test]
    fn test_edges_reach_first_step_only() {
        let mut stepper = FixedStep::new(0.25, 5);
        let mut sim = Recorder::default();
        let input = TickInput::default().press(Key::Launch).hold(Key::MoveLeft);
        stepper.run_iteration(0.75, &mut sim, || input);
        assert_eq!(sim.inputs.len(), 3);
        assert!(sim.inputs[0].was_pressed(Key::Launch));
        assert!(sim.inputs[1..].iter().all(|i| !i.was_pressed(Key::Launch)));
        assert!(sim.inputs.iter().all(|i| i.is_held(Key::MoveLeft)));
    }

    #[test]
    fn test_latch_skipped_when_no_step_due() {
        let mut stepper = FixedStep::new(0.25, 5);
        let mut sim = Recorder::default();
        let steps = stepper.run_iteration(0.1, &mut sim, || panic!("latched without a step"));
        assert_eq!(steps, 0);
        assert!(sim.inputs.is_empty());
    }

    fn session() -> GameplaySession {
        let mut session =
            GameplaySession::new(SessionConfig::default(), LevelCatalog::builtin()).unwrap();
        session.begin_new_session();
        session
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            target_rate: 240,
            max_steps_per_iteration: 8,
            idle_millis: 1,
        }
    }

    #[test]
    fn test_start_stop_idempotent() {
        let frames = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&frames);
        let sink = move |_frame: &FrameSnapshot, _events: &[SessionEvent]| {
            *counter.lock().unwrap() += 1;
        };
        let mut scheduler = Scheduler::new(fast_config(), session(), Box::new(sink)).unwrap();

        scheduler.stop().unwrap();
        scheduler.start().unwrap();
        scheduler.start().unwrap();
        assert!(scheduler.is_running());
        assert!(scheduler.session().is_none());

        thread::sleep(Duration::from_millis(100));
        scheduler.stop().unwrap();
        scheduler.stop().unwrap();
        assert!(!scheduler.is_running());

        let session = scheduler.session().unwrap();
        assert!(session.time_ticks() > 0);
        assert!(*frames.lock().unwrap() > 0);
    }

    #[test]
    fn test_commands_reach_running_session() {
        let mut scheduler =
            Scheduler::new(fast_config(), session(), Box::new(NullSink)).unwrap();
        scheduler.start().unwrap();
        assert!(scheduler.send(SessionCommand::Pause));
        thread::sleep(Duration::from_millis(50));
        let session = scheduler.into_session().unwrap();
        assert!(session.is_paused());
    }

    #[test]
    fn test_command_sent_right_before_stop_is_applied() {
        let paused = Arc::new(Mutex::new(false));
        let seen = Arc::clone(&paused);
        let sink = move |_frame: &FrameSnapshot, events: &[SessionEvent]| {
            if events.contains(&SessionEvent::Paused) {
                *seen.lock().unwrap() = true;
            }
        };
        for _ in 0..10 {
            *paused.lock().unwrap() = false;
            let mut scheduler =
                Scheduler::new(fast_config(), session(), Box::new(sink.clone())).unwrap();
            scheduler.start().unwrap();
            thread::sleep(Duration::from_millis(5));
            assert!(scheduler.send(SessionCommand::Pause));
            let session = scheduler.into_session().unwrap();
            assert!(session.is_paused());
            assert!(*paused.lock().unwrap());
        }
    }

    #[test]
    fn test_send_while_stopped_applies_directly() {
        let mut scheduler =
            Scheduler::new(fast_config(), session(), Box::new(NullSink)).unwrap();
        assert!(scheduler.commands().is_none());
        assert!(scheduler.send(SessionCommand::EndSession));
        assert!(!scheduler.session().unwrap().is_session_active());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SchedulerConfig {
            target_rate: 0,
            ..Default::default()
        };
        let result = Scheduler::new(config, session(), Box::new(NullSink));
        assert!(matches!(result, Err(SchedulerError::Config(_))));
    }
}
