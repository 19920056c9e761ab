use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, SessionConfig};

/// Every command and phase boundary produces an Event.
/// Renderers print them; notifiers turn the boundary ones into tones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        round: u32,
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        round: u32,
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    Reconfigured {
        config: SessionConfig,
        at: DateTime<Utc>,
    },
    /// A work or break phase ran its full length. `round` is the round it belonged to.
    PhaseCompleted {
        phase: Phase,
        round: u32,
        at: DateTime<Utc>,
    },
    PhaseStarted {
        phase: Phase,
        round: u32,
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    /// Final work phase finished; the engine stopped itself.
    SessionCompleted {
        total_rounds: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at }
            | Event::Reconfigured { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::PhaseStarted { at, .. }
            | Event::SessionCompleted { at, .. } => *at,
        }
    }

    /// Phase boundaries and session end; the events a notifier reacts to.
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            Event::PhaseCompleted { .. } | Event::SessionCompleted { .. }
        )
    }
}

/// Point-in-time view of timer progress for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub current_round: u32,
    pub total_rounds: u32,
    pub is_running: bool,
    pub elapsed_secs: f64,
    pub remaining_secs: f64,
    /// 0.0 ..= 1.0 within the current phase.
    pub progress: f64,
}

impl Snapshot {
    pub(crate) fn new(
        phase: Phase,
        current_round: u32,
        total_rounds: u32,
        is_running: bool,
        elapsed_secs: f64,
        duration_secs: f64,
    ) -> Self {
        let elapsed_secs = elapsed_secs.clamp(0.0, duration_secs);
        let progress = if duration_secs > 0.0 {
            (elapsed_secs / duration_secs).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            phase,
            current_round,
            total_rounds,
            is_running,
            elapsed_secs,
            remaining_secs: duration_secs - elapsed_secs,
            progress,
        }
    }
}
