//! # Interval Core Library
//!
//! Core logic for an interval-training countdown timer: alternating work and
//! break phases over a configurable number of rounds. The CLI is a thin layer
//! that renders snapshots and plays tones on top of this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A clock-anchored state machine that requires the caller
//!   to periodically invoke `tick()` for progress updates
//! - **Runner**: A tokio task that owns an engine and serializes commands with
//!   the sampling loop
//! - **Notify**: Tone cues for phase boundaries, best-effort
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionConfig`]: Work/break lengths and round count
//! - [`Event`] / [`Snapshot`]: What the engine reports
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod runner;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ValidationError};
pub use events::{Event, Snapshot};
pub use notify::{notify, Cue, Notifier, NotifyError, Tone};
pub use runner::{RunnerHandle, Update};
pub use storage::{Config, SoundKind};
pub use timer::{
    Clock, ManualClock, MonotonicClock, Phase, SessionConfig, Status, Tick, TimerEngine,
    TimerState, TokioClock, MAX_PHASE_SECS, MAX_ROUNDS,
};
