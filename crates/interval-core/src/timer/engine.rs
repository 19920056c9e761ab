//! Timer engine implementation.
//!
//! The engine is a clock-anchored state machine. It owns no thread; whoever
//! drives it calls `tick()` at any cadence it likes. Elapsed time is always
//! recomputed from clock readings, so the tick rate only affects how smooth
//! the rendering looks, never the timing itself.
//!
//! ## Phase Transitions
//!
//! ```text
//! Work(n) -> Break(n) -> Work(n+1) -> ... -> Work(total) -> Completed
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(SessionConfig::default());
//! engine.start();
//! // In a loop:
//! if let Some(tick) = engine.tick() { render(tick.snapshot); notify(tick.events); }
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::clock::{Clock, MonotonicClock};
use super::session::{Phase, SessionConfig};
use crate::error::{CoreError, Result};
use crate::events::{Event, Snapshot};

/// Coarse run status, derived from the engine fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Plain copy of the engine's mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub current_round: u32,
    pub elapsed_secs: f64,
    pub is_running: bool,
}

impl TimerState {
    pub const INITIAL: TimerState = TimerState {
        phase: Phase::Work,
        current_round: 1,
        elapsed_secs: 0.0,
        is_running: false,
    };
}

/// Result of one `tick()` while running.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Progress at this tick. At a boundary it is the finished phase clamped to 100%.
    pub snapshot: Snapshot,
    /// Empty unless a phase boundary was crossed.
    pub events: Vec<Event>,
}

impl Tick {
    pub fn crossed_boundary(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn session_completed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, Event::SessionCompleted { .. }))
    }
}

/// Core timer engine.
///
/// `elapsed` holds the time accumulated before the current running stretch;
/// `anchor` is the clock reading the stretch started at. While paused,
/// `anchor` is `None` and `elapsed` is the frozen value.
#[derive(Debug, Clone)]
pub struct TimerEngine<C: Clock = MonotonicClock> {
    clock: C,
    config: SessionConfig,
    phase: Phase,
    current_round: u32,
    elapsed: Duration,
    anchor: Option<Duration>,
}

impl TimerEngine<MonotonicClock> {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> TimerEngine<C> {
    pub fn with_clock(config: SessionConfig, clock: C) -> Self {
        Self {
            clock,
            config: config.clamped(),
            phase: Phase::Work,
            current_round: 1,
            elapsed: Duration::ZERO,
            anchor: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn status(&self) -> Status {
        if self.phase == Phase::Completed {
            Status::Completed
        } else if self.is_running() {
            Status::Running
        } else if self.phase == Phase::Work
            && self.current_round == 1
            && self.elapsed.is_zero()
        {
            Status::Idle
        } else {
            Status::Paused
        }
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            phase: self.phase,
            current_round: self.current_round,
            elapsed_secs: self.sample().as_secs_f64(),
            is_running: self.is_running(),
        }
    }

    /// Elapsed time in the current phase at clock reading `now`. Never mutates.
    pub fn sample_at(&self, now: Duration) -> Duration {
        match self.anchor {
            Some(anchor) => self.elapsed + now.saturating_sub(anchor),
            None => self.elapsed,
        }
    }

    pub fn sample(&self) -> Duration {
        self.sample_at(self.clock.now())
    }

    pub fn snapshot_at(&self, now: Duration) -> Snapshot {
        Snapshot::new(
            self.phase,
            self.current_round,
            self.config.total_rounds,
            self.is_running(),
            self.sample_at(now).as_secs_f64(),
            self.config.duration_secs(self.phase),
        )
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_at(self.clock.now())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin or resume counting. No-op while running or after the session completed.
    pub fn start(&mut self) -> Option<Event> {
        if self.is_running() || self.phase == Phase::Completed {
            return None;
        }
        self.anchor = Some(self.clock.now());
        debug!(phase = %self.phase, round = self.current_round, elapsed = ?self.elapsed, "timer started");
        Some(Event::TimerStarted {
            phase: self.phase,
            round: self.current_round,
            elapsed_secs: self.elapsed.as_secs_f64(),
            at: Utc::now(),
        })
    }

    /// Freeze elapsed time. No-op unless running.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        let now = self.clock.now();
        self.elapsed = self.sample_at(now);
        self.anchor = None;
        debug!(phase = %self.phase, round = self.current_round, elapsed = ?self.elapsed, "timer paused");
        Some(Event::TimerPaused {
            phase: self.phase,
            round: self.current_round,
            elapsed_secs: self.elapsed.as_secs_f64(),
            at: Utc::now(),
        })
    }

    /// Back to round 1 of Work, stopped. The config is kept.
    pub fn reset(&mut self) -> Option<Event> {
        self.phase = Phase::Work;
        self.current_round = 1;
        self.elapsed = Duration::ZERO;
        self.anchor = None;
        debug!("timer reset");
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Replace the session config while stopped.
    ///
    /// Fields are clamped to at least 1. If the new round count is below the
    /// current round, the current round drops to the new last round.
    pub fn reconfigure(&mut self, config: SessionConfig) -> Result<Event> {
        if self.is_running() {
            return Err(CoreError::ConfigLocked);
        }
        self.config = config.clamped();
        if self.current_round > self.config.total_rounds {
            debug!(
                from = self.current_round,
                to = self.config.total_rounds,
                "current round lowered to fit new round count"
            );
            self.current_round = self.config.total_rounds;
        }
        debug!(config = ?self.config, "session reconfigured");
        Ok(Event::Reconfigured {
            config: self.config,
            at: Utc::now(),
        })
    }

    /// Call periodically. Returns `None` when not running.
    pub fn tick(&mut self) -> Option<Tick> {
        let now = self.clock.now();
        self.tick_at(now)
    }

    /// `tick()` against an explicit clock reading.
    pub fn tick_at(&mut self, now: Duration) -> Option<Tick> {
        if !self.is_running() {
            return None;
        }
        let elapsed = self.sample_at(now);
        let duration = self.config.duration(self.phase);

        if elapsed < duration {
            return Some(Tick {
                snapshot: self.snapshot_at(now),
                events: Vec::new(),
            });
        }

        let finished = self.phase;
        let round = self.current_round;
        let continues = finished == Phase::Break || round < self.config.total_rounds;
        let snapshot = Snapshot::new(
            finished,
            round,
            self.config.total_rounds,
            continues,
            duration.as_secs_f64(),
            duration.as_secs_f64(),
        );
        let at = Utc::now();
        let mut events = vec![Event::PhaseCompleted {
            phase: finished,
            round,
            at,
        }];
        debug!(phase = %finished, round, overshoot = ?(elapsed - duration), "phase completed");

        match (finished, continues) {
            (Phase::Work, false) => {
                self.phase = Phase::Completed;
                self.elapsed = duration;
                self.anchor = None;
                debug!(rounds = self.config.total_rounds, "session completed");
                events.push(Event::SessionCompleted {
                    total_rounds: self.config.total_rounds,
                    at,
                });
                return Some(Tick { snapshot, events });
            }
            (Phase::Work, true) => {
                self.phase = Phase::Break;
            }
            (Phase::Break, _) => {
                self.phase = Phase::Work;
                self.current_round += 1;
            }
            (Phase::Completed, _) => return None,
        }

        // Measure the next phase from this instant; the overshoot is dropped.
        self.elapsed = Duration::ZERO;
        self.anchor = Some(now);
        events.push(Event::PhaseStarted {
            phase: self.phase,
            round: self.current_round,
            duration_secs: self.config.duration_secs(self.phase),
            at,
        });
        Some(Tick { snapshot, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::ManualClock;

    fn engine(work: f64, brk: f64, rounds: u32) -> (TimerEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let engine = TimerEngine::with_clock(SessionConfig::new(work, brk, rounds), clock.clone());
        (engine, clock)
    }

    #[test]
    fn default_engine_runs_on_monotonic_clock() {
        let mut engine = TimerEngine::new(SessionConfig::default());
        assert_eq!(engine.status(), Status::Idle);
        let before = Utc::now();
        let event = engine.start().unwrap();
        assert!(event.at() >= before);
        assert!(engine.is_running());
        assert!(engine.sample() < Duration::from_secs(30));
    }

    #[test]
    fn start_pause_start() {
        let (mut engine, _clock) = engine(30.0, 20.0, 3);
        assert_eq!(engine.status(), Status::Idle);

        assert!(engine.start().is_some());
        assert_eq!(engine.status(), Status::Running);

        assert!(engine.pause().is_some());
        assert_eq!(engine.status(), Status::Paused);

        assert!(engine.start().is_some());
        assert_eq!(engine.status(), Status::Running);
    }

    #[test]
    fn start_twice_is_a_noop() {
        let (mut engine, clock) = engine(30.0, 20.0, 3);
        engine.start();
        clock.advance_secs(4.0);
        assert!(engine.start().is_none());
        assert_eq!(engine.sample(), Duration::from_secs(4));
    }

    #[test]
    fn pause_while_paused_is_a_noop() {
        let (mut engine, clock) = engine(30.0, 20.0, 3);
        assert!(engine.pause().is_none());
        engine.start();
        clock.advance_secs(2.0);
        engine.pause();
        let before = engine.state();
        clock.advance_secs(10.0);
        assert!(engine.pause().is_none());
        assert_eq!(engine.state(), before);
    }

    #[test]
    fn paused_elapsed_is_frozen() {
        let (mut engine, clock) = engine(30.0, 20.0, 3);
        engine.start();
        clock.advance_secs(12.3);
        engine.pause();
        clock.advance_secs(5.0);
        assert!((engine.sample().as_secs_f64() - 12.3).abs() < 1e-6);
        assert!(engine.tick().is_none());
    }

    #[test]
    fn tick_below_duration_reports_progress() {
        let (mut engine, clock) = engine(30.0, 20.0, 3);
        engine.start();
        clock.advance_secs(15.0);
        let tick = engine.tick().unwrap();
        assert!(!tick.crossed_boundary());
        assert_eq!(tick.snapshot.phase, Phase::Work);
        assert_eq!(tick.snapshot.elapsed_secs, 15.0);
        assert_eq!(tick.snapshot.remaining_secs, 15.0);
        assert_eq!(tick.snapshot.progress, 0.5);
    }

    #[test]
    fn boundary_snapshot_is_clamped_and_next_phase_reanchored() {
        let (mut engine, clock) = engine(30.0, 20.0, 3);
        engine.start();
        clock.advance_secs(30.8);
        let tick = engine.tick().unwrap();
        assert_eq!(tick.snapshot.phase, Phase::Work);
        assert_eq!(tick.snapshot.elapsed_secs, 30.0);
        assert_eq!(tick.snapshot.progress, 1.0);
        assert!(matches!(
            tick.events[0],
            Event::PhaseCompleted { phase: Phase::Work, round: 1, .. }
        ));
        assert!(tick.snapshot.is_running);
        assert_eq!(engine.phase(), Phase::Break);
        assert_eq!(engine.current_round(), 1);
        // Overshoot is not carried into the break.
        assert_eq!(engine.sample(), Duration::ZERO);
    }

    #[test]
    fn final_work_phase_completes_session() {
        let (mut engine, clock) = engine(5.0, 3.0, 1);
        engine.start();
        clock.advance_secs(5.0);
        let tick = engine.tick().unwrap();
        assert!(tick.session_completed());
        assert!(!tick.snapshot.is_running);
        assert_eq!(tick.snapshot.progress, 1.0);
        assert_eq!(engine.phase(), Phase::Completed);
        assert_eq!(engine.status(), Status::Completed);
        assert!(!engine.is_running());
        assert_eq!(engine.current_round(), 1);

        clock.advance_secs(100.0);
        assert!(engine.tick().is_none());
        assert!(engine.start().is_none());
        assert_eq!(engine.snapshot().progress, 1.0);
    }

    #[test]
    fn reset_goes_to_beginning() {
        let (mut engine, clock) = engine(2.0, 2.0, 3);
        engine.start();
        clock.advance_secs(2.0);
        engine.tick();
        clock.advance_secs(1.0);
        engine.reset();
        assert_eq!(engine.state(), TimerState::INITIAL);
        assert_eq!(engine.config().total_rounds, 3);
    }

    #[test]
    fn reconfigure_is_locked_while_running() {
        let (mut engine, _clock) = engine(30.0, 20.0, 3);
        engine.start();
        let err = engine.reconfigure(SessionConfig::new(10.0, 5.0, 2)).unwrap_err();
        assert!(matches!(err, CoreError::ConfigLocked));
        assert_eq!(*engine.config(), SessionConfig::new(30.0, 20.0, 3));
    }

    #[test]
    fn reconfigure_while_paused_keeps_progress() {
        let (mut engine, clock) = engine(30.0, 20.0, 3);
        engine.start();
        clock.advance_secs(7.0);
        engine.pause();
        engine.reconfigure(SessionConfig::new(60.0, 20.0, 3)).unwrap();
        assert_eq!(engine.sample(), Duration::from_secs(7));
        assert_eq!(engine.snapshot().remaining_secs, 53.0);
    }

    #[test]
    fn reconfigure_clamps_round_and_fields() {
        let (mut engine, clock) = engine(1.0, 1.0, 3);
        engine.start();
        for _ in 0..2 {
            clock.advance_secs(1.0);
            engine.tick();
        }
        assert_eq!(engine.current_round(), 2);
        engine.pause();
        let event = engine
            .reconfigure(SessionConfig {
                work_secs: 0.0,
                break_secs: f64::NAN,
                total_rounds: 1,
            })
            .unwrap();
        assert_eq!(engine.current_round(), 1);
        match event {
            Event::Reconfigured { config, .. } => {
                assert_eq!(config, SessionConfig::new(1.0, 1.0, 1));
            }
            other => panic!("expected Reconfigured, got {other:?}"),
        }
    }
}
