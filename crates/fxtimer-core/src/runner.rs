//! The sampling loop.
//!
//! One task owns the [`Session`] and is the only place that ticks it. User
//! actions arrive over a channel and are applied one at a time. The sampling
//! interval exists only while the engine is running; every command drops it,
//! and a fresh one is created if the engine is still running afterwards.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::events::Event;
use crate::session::Session;
use crate::timer::{Clock, TimerState};
use crate::workout::WorkoutRequest;

/// Default sampling cadence.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum Command {
    /// Start, resume, or rerun a finished workout.
    Start,
    Pause,
    Skip,
    Prev,
    Restart,
    /// Rebuild from a new request; the result is sent back.
    Build(WorkoutRequest, oneshot::Sender<Result<(), String>>),
    Snapshot(oneshot::Sender<Event>),
    Quit,
}

#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    pub tick_interval: Duration,
    /// Return from the loop once the workout completes.
    pub exit_when_done: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            exit_when_done: false,
        }
    }
}

/// Drive `session` until `Quit`, the channel closes, or (optionally) the
/// workout completes. Returns the session.
pub async fn run<C: Clock>(
    mut session: Session<C>,
    mut commands: mpsc::Receiver<Command>,
    options: RunnerOptions,
) -> Session<C> {
    let period = options.tick_interval.max(Duration::from_millis(1));
    let mut ticker: Option<Interval> = None;

    loop {
        tokio::select! {
            command = commands.recv() => {
                // Cancel the pending sample before applying anything.
                ticker = None;
                let Some(command) = command else {
                    debug!("command channel closed");
                    break;
                };
                if !apply(&mut session, command) {
                    break;
                }
                if session.is_running() {
                    ticker = Some(new_ticker(period));
                }
            }
            _ = next_tick(&mut ticker), if ticker.is_some() => {
                session.tick();
                if !session.is_running() {
                    ticker = None;
                    if options.exit_when_done && session.status() == TimerState::Done {
                        info!("workout done, runner exiting");
                        break;
                    }
                }
            }
        }
    }

    session
}

/// Apply one command. `false` means stop the loop.
fn apply<C: Clock>(session: &mut Session<C>, command: Command) -> bool {
    debug!(?command, "command");
    match command {
        Command::Start => {
            session.start();
        }
        Command::Pause => {
            session.pause();
        }
        Command::Skip => {
            session.skip();
        }
        Command::Prev => {
            session.prev();
        }
        Command::Restart => {
            session.restart();
        }
        Command::Build(request, reply) => {
            let result = session.build(&request).map(|_| ()).map_err(|e| e.to_string());
            let _ = reply.send(result);
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(session.snapshot());
        }
        Command::Quit => return false,
    }
    true
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Handle to a spawned runner.
pub struct RunnerHandle<C: Clock> {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<Session<C>>,
}

impl<C> RunnerHandle<C>
where
    C: Clock + Send + 'static,
{
    pub fn spawn(session: Session<C>, options: RunnerOptions) -> Self {
        let (commands, rx) = mpsc::channel(32);
        let task = tokio::spawn(run(session, rx, options));
        Self { commands, task }
    }

    pub fn sender(&self) -> mpsc::Sender<Command> {
        self.commands.clone()
    }

    /// `false` once the runner has stopped.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn snapshot(&self) -> Option<Event> {
        let (tx, rx) = oneshot::channel();
        if !self.send(Command::Snapshot(tx)).await {
            return None;
        }
        rx.await.ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end on its own.
    pub async fn join(self) -> Result<Session<C>, tokio::task::JoinError> {
        let Self { commands, task } = self;
        drop(commands);
        task.await
    }

    /// Ask the loop to stop and return the session.
    pub async fn quit(self) -> Result<Session<C>, tokio::task::JoinError> {
        let _ = self.commands.send(Command::Quit).await;
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryCuePlayer;
    use crate::exercise::{ExercisePool, ExerciseRecord};
    use crate::plan::TimingSpec;
    use crate::session::NullSink;
    use crate::timer::ManualClock;

    fn session(clock: &ManualClock) -> Session<ManualClock> {
        let mut session = Session::with_clock(
            clock.clone(),
            Box::new(MemoryCuePlayer::new()),
            Box::new(NullSink),
        )
        .with_seed(1);
        session.set_pool(ExercisePool::new(vec![
            ExerciseRecord::new("Squat", "legs"),
            ExerciseRecord::new("Push-up", "upper"),
        ]));
        session
            .build(&WorkoutRequest {
                exercise_count: 2,
                set_count: 1,
                ready_seconds: 3,
                set_timings: vec![TimingSpec::with_work(4, 2)],
                ..WorkoutRequest::default()
            })
            .unwrap();
        session
    }

    fn options() -> RunnerOptions {
        RunnerOptions {
            tick_interval: Duration::from_millis(5),
            exit_when_done: true,
        }
    }

    fn state_of(event: Option<Event>) -> TimerState {
        match event {
            Some(Event::StateSnapshot { state, .. }) => state,
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn commands_drive_the_session() {
        let clock = ManualClock::new(0);
        let handle = RunnerHandle::spawn(session(&clock), options());

        assert_eq!(state_of(handle.snapshot().await), TimerState::Idle);
        handle.send(Command::Start).await;
        assert_eq!(state_of(handle.snapshot().await), TimerState::Running);
        handle.send(Command::Pause).await;
        assert_eq!(state_of(handle.snapshot().await), TimerState::Paused);
        handle.send(Command::Skip).await;
        match handle.snapshot().await {
            Some(Event::StateSnapshot {
                state, plan_index, ..
            }) => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(plan_index, 1);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }

        let session = handle.quit().await.unwrap();
        assert_eq!(session.engine().plan_index(), 1);
    }

    #[tokio::test]
    async fn runs_to_completion_and_exits() {
        let clock = ManualClock::new(0);
        let handle = RunnerHandle::spawn(session(&clock), options());
        handle.send(Command::Start).await;
        assert_eq!(state_of(handle.snapshot().await), TimerState::Running);
        // Every remaining block is already over; one block per sample.
        clock.advance(60_000);

        let session = tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .expect("runner did not finish")
            .unwrap();
        assert_eq!(session.status(), TimerState::Done);
        assert_eq!(session.engine().progress().percent, 100);
    }

    #[tokio::test]
    async fn rejected_build_reports_error() {
        let clock = ManualClock::new(0);
        let handle = RunnerHandle::spawn(session(&clock), options());
        let (tx, rx) = oneshot::channel();
        handle
            .send(Command::Build(
                WorkoutRequest {
                    exercise_count: 5,
                    ..WorkoutRequest::default()
                },
                tx,
            ))
            .await;
        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err, "Not enough unique exercises for N=5. Available: 2.");
        handle.quit().await.unwrap();
    }
}
