//! Brickfall headless runner
//!
//! Plays the built-in levels with a simple autopilot on the fixed-step
//! scheduler and logs how far it got.
//!
//! Usage: `brickfall [seconds] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use brickfall::sim::{EntityKind, FrameSnapshot, SessionEvent, SessionPhase};
    use brickfall::{
        GameplaySession, InputLatch, Key, LevelCatalog, Scheduler, SchedulerConfig, SessionConfig,
    };

    const DEFAULT_SECONDS: u64 = 30;
    /// Paddle stops chasing once the ball is this close to its centre
    const DEAD_ZONE: f32 = 8.0;

    /// Sink that steers the paddle under the lowest ball and logs milestones
    fn autopilot(
        latch: InputLatch,
        finished: Arc<AtomicBool>,
    ) -> impl FnMut(&FrameSnapshot, &[SessionEvent]) + Send {
        move |frame: &FrameSnapshot, events: &[SessionEvent]| {
            for event in events {
                match event {
                    SessionEvent::LevelLoaded { .. }
                    | SessionEvent::LifeLost { .. }
                    | SessionEvent::LevelCleared { .. }
                    | SessionEvent::PowerUpCollected { .. } => log::info!("{:?}", event),
                    _ => log::trace!("{:?}", event),
                }
            }

            if frame.phase.is_terminal() {
                latch.reset_all();
                finished.store(true, Ordering::Release);
                return;
            }
            if frame.phase == SessionPhase::Serve {
                latch.tap(Key::Launch);
            }

            let Some(paddle) = frame.entities.iter().find(|e| e.kind == EntityKind::Paddle) else {
                return;
            };
            let center = paddle.x + paddle.width / 2.0;
            let target = frame
                .balls()
                .max_by(|a, b| a.y.total_cmp(&b.y))
                .map(|ball| ball.x + ball.width / 2.0);

            match target {
                Some(x) if x < center - DEAD_ZONE => {
                    latch.release(Key::MoveRight);
                    latch.press(Key::MoveLeft);
                }
                Some(x) if x > center + DEAD_ZONE => {
                    latch.release(Key::MoveLeft);
                    latch.press(Key::MoveRight);
                }
                _ => {
                    latch.release(Key::MoveLeft);
                    latch.release(Key::MoveRight);
                }
            }
        }
    }

    fn parse_arg(index: usize) -> Result<Option<u64>, std::num::ParseIntError> {
        std::env::args().nth(index).map(|s| s.parse()).transpose()
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let seconds = parse_arg(1)?.unwrap_or(DEFAULT_SECONDS);
        let config = match parse_arg(2)? {
            Some(seed) => SessionConfig::default().with_seed(seed),
            None => SessionConfig::default(),
        };

        let catalog = LevelCatalog::builtin();
        log::info!("Brickfall starting: {} levels, {}s budget", catalog.len(), seconds);
        let mut session = GameplaySession::new(config, catalog)?;
        session.begin_new_session();

        let latch = InputLatch::new();
        let finished = Arc::new(AtomicBool::new(false));
        let sink = autopilot(latch.clone(), Arc::clone(&finished));
        let mut scheduler =
            Scheduler::new(SchedulerConfig::default(), session, Box::new(sink))?.with_input(latch);
        scheduler.start()?;

        let deadline = Instant::now() + Duration::from_secs(seconds);
        while Instant::now() < deadline && !finished.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(50));
        }

        let session = scheduler.into_session()?;
        log::info!(
            "Finished on '{}' after {} steps: score {}, lives {}, phase {:?}",
            session.level().id,
            session.time_ticks(),
            session.score(),
            session.lives(),
            session.phase()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = native::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless runner on the web; the library is driven by the host page
}
