//! Async driver that owns a [`TimerEngine`] on a tokio task.
//!
//! Commands and samples are serialized through one `select!` loop. The tick
//! branch is only armed while the engine runs, so there is never more than
//! one sampling activity, and once a `pause`/`reset` has been acknowledged no
//! further snapshots or events come out of the loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::error::{CoreError, Result};
use crate::events::{Event, Snapshot};
use crate::timer::{Clock, SessionConfig, TimerEngine};

/// Default sampling period.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

const COMMAND_BUFFER: usize = 32;

/// Output of the runner, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Update {
    Snapshot(Snapshot),
    Event(Event),
}

enum Command {
    Start(oneshot::Sender<Option<Event>>),
    Pause(oneshot::Sender<Option<Event>>),
    Toggle(oneshot::Sender<Option<Event>>),
    Reset(oneshot::Sender<Option<Event>>),
    Reconfigure(SessionConfig, oneshot::Sender<Result<Event>>),
    Snapshot(oneshot::Sender<Snapshot>),
}

/// Cheap, cloneable sender side of a running session.
///
/// Each call resolves once the loop has applied the command.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    commands: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Start(_) => "Start",
            Command::Pause(_) => "Pause",
            Command::Toggle(_) => "Toggle",
            Command::Reset(_) => "Reset",
            Command::Reconfigure(..) => "Reconfigure",
            Command::Snapshot(_) => "Snapshot",
        };
        f.write_str(name)
    }
}

impl RunnerHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| CoreError::RunnerClosed)?;
        rx.await.map_err(|_| CoreError::RunnerClosed)
    }

    pub async fn start(&self) -> Result<Option<Event>> {
        self.request(Command::Start).await
    }

    pub async fn pause(&self) -> Result<Option<Event>> {
        self.request(Command::Pause).await
    }

    /// Pause when running, start otherwise.
    pub async fn toggle(&self) -> Result<Option<Event>> {
        self.request(Command::Toggle).await
    }

    pub async fn reset(&self) -> Result<Option<Event>> {
        self.request(Command::Reset).await
    }

    /// Fails with [`CoreError::ConfigLocked`] while running.
    pub async fn reconfigure(&self, config: SessionConfig) -> Result<Event> {
        self.request(|tx| Command::Reconfigure(config, tx)).await?
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(Command::Snapshot).await
    }
}

struct SessionRunner<C: Clock> {
    engine: TimerEngine<C>,
    updates: mpsc::UnboundedSender<Update>,
}

/// Spawn the loop on the current tokio runtime.
///
/// The task ends when every [`RunnerHandle`] is dropped and hands the engine back.
pub fn spawn<C>(
    engine: TimerEngine<C>,
    period: Duration,
) -> (
    RunnerHandle,
    mpsc::UnboundedReceiver<Update>,
    JoinHandle<TimerEngine<C>>,
)
where
    C: Clock + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let runner = SessionRunner {
        engine,
        updates: update_tx,
    };
    let task = tokio::spawn(runner.run(cmd_rx, period));
    (RunnerHandle { commands: cmd_tx }, update_rx, task)
}

impl<C: Clock> SessionRunner<C> {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, period: Duration) -> TimerEngine<C> {
        let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(?period, "session runner started");

        loop {
            tokio::select! {
                biased;
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd, &mut ticker),
                    None => break,
                },
                _ = ticker.tick(), if self.engine.is_running() => self.sample(),
            }
        }

        debug!("session runner stopped");
        self.engine
    }

    fn apply(&mut self, cmd: Command, ticker: &mut Interval) {
        trace!(?cmd, "runner command");
        match cmd {
            Command::Start(reply) => {
                let event = self.engine.start();
                if event.is_some() {
                    ticker.reset();
                }
                self.publish_command(event.clone());
                let _ = reply.send(event);
            }
            Command::Pause(reply) => {
                let event = self.engine.pause();
                self.publish_command(event.clone());
                let _ = reply.send(event);
            }
            Command::Toggle(reply) => {
                let event = if self.engine.is_running() {
                    self.engine.pause()
                } else {
                    let event = self.engine.start();
                    if event.is_some() {
                        ticker.reset();
                    }
                    event
                };
                self.publish_command(event.clone());
                let _ = reply.send(event);
            }
            Command::Reset(reply) => {
                let event = self.engine.reset();
                self.publish_command(event.clone());
                let _ = reply.send(event);
            }
            Command::Reconfigure(config, reply) => {
                let result = self.engine.reconfigure(config);
                if let Ok(event) = &result {
                    self.publish_command(Some(event.clone()));
                }
                let _ = reply.send(result);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
            }
        }
    }

    /// The command's event followed by a fresh snapshot, so renderers see the new state.
    fn publish_command(&self, event: Option<Event>) {
        if let Some(event) = event {
            self.send(Update::Event(event));
            self.send(Update::Snapshot(self.engine.snapshot()));
        }
    }

    fn sample(&mut self) {
        let Some(tick) = self.engine.tick() else {
            return;
        };
        self.send(Update::Snapshot(tick.snapshot));
        for event in tick.events {
            self.send(Update::Event(event));
        }
    }

    fn send(&self, update: Update) {
        // A dropped receiver only means nobody renders; the session keeps going.
        let _ = self.updates.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{Phase, TokioClock};
    use tokio::sync::mpsc::error::TryRecvError;

    fn spawn_session(
        config: SessionConfig,
    ) -> (
        RunnerHandle,
        mpsc::UnboundedReceiver<Update>,
        JoinHandle<TimerEngine<TokioClock>>,
    ) {
        spawn(TimerEngine::with_clock(config, TokioClock::new()), DEFAULT_TICK)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_a_session_to_completion() {
        let (handle, mut updates, _task) = spawn_session(SessionConfig::new(2.0, 1.0, 2));
        handle.start().await.unwrap();

        let mut boundaries = Vec::new();
        while let Some(update) = updates.recv().await {
            match update {
                Update::Event(Event::PhaseCompleted { phase, round, .. }) => {
                    boundaries.push((phase, round))
                }
                Update::Event(Event::SessionCompleted { total_rounds, .. }) => {
                    assert_eq!(total_rounds, 2);
                    break;
                }
                _ => {}
            }
        }

        assert_eq!(
            boundaries,
            vec![(Phase::Work, 1), (Phase::Break, 1), (Phase::Work, 2)]
        );
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, Phase::Completed);
        assert!(!snap.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_preserves_elapsed_and_stops_output() {
        let (handle, mut updates, _task) = spawn_session(SessionConfig::default());
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(12_300)).await;

        let paused = handle.pause().await.unwrap();
        let Some(Event::TimerPaused { elapsed_secs, .. }) = paused else {
            panic!("expected TimerPaused, got {paused:?}");
        };
        assert!((elapsed_secs - 12.3).abs() < 0.01);

        while updates.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(updates.try_recv(), Err(TryRecvError::Empty));

        handle.start().await.unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert!((snap.elapsed_secs - 12.3).abs() < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_and_reset() {
        let (handle, _updates, _task) = spawn_session(SessionConfig::default());
        assert!(matches!(
            handle.toggle().await.unwrap(),
            Some(Event::TimerStarted { .. })
        ));
        assert!(handle.start().await.unwrap().is_none());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(matches!(
            handle.toggle().await.unwrap(),
            Some(Event::TimerPaused { .. })
        ));

        handle.reset().await.unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.elapsed_secs, 0.0);
        assert_eq!(snap.current_round, 1);
        assert_eq!(snap.phase, Phase::Work);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_running_stops_output() {
        let (handle, mut updates, _task) = spawn_session(SessionConfig::new(2.0, 1.0, 3));
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert!(matches!(
            handle.reset().await.unwrap(),
            Some(Event::TimerReset { .. })
        ));
        while updates.try_recv().is_ok() {}

        tokio::time::sleep(DEFAULT_TICK * 30).await;
        assert_eq!(updates.try_recv(), Err(TryRecvError::Empty));

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.phase, Phase::Work);
        assert_eq!(snap.current_round, 1);
        assert_eq!(snap.elapsed_secs, 0.0);
        assert!(!snap.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn reconfigure_rejected_while_running() {
        let (handle, _updates, _task) = spawn_session(SessionConfig::default());
        handle.start().await.unwrap();
        let err = handle
            .reconfigure(SessionConfig::new(5.0, 5.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigLocked));

        handle.pause().await.unwrap();
        handle
            .reconfigure(SessionConfig::new(5.0, 5.0, 1))
            .await
            .unwrap();
        assert_eq!(handle.snapshot().await.unwrap().total_rounds, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_returns_engine() {
        let (handle, _updates, task) = spawn_session(SessionConfig::default());
        handle.start().await.unwrap();
        drop(handle);
        let engine = task.await.unwrap();
        assert!(engine.is_running());
    }
}
