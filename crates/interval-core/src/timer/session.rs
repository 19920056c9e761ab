use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;

/// Smallest accepted value for every session field.
pub const MIN_FIELD: f64 = 1.0;

/// Longest accepted phase, one week.
pub const MAX_PHASE_SECS: f64 = 7.0 * 24.0 * 3600.0;

/// Largest accepted round count.
pub const MAX_ROUNDS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
    /// Final work phase finished. Only `reset()` leaves this phase.
    Completed,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
            Phase::Completed => "Done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Work/break durations and round count for one run of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_work_secs")]
    pub work_secs: f64,
    #[serde(default = "default_break_secs")]
    pub break_secs: f64,
    #[serde(default = "default_total_rounds")]
    pub total_rounds: u32,
}

fn default_work_secs() -> f64 {
    30.0
}
fn default_break_secs() -> f64 {
    20.0
}
fn default_total_rounds() -> u32 {
    3
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            break_secs: default_break_secs(),
            total_rounds: default_total_rounds(),
        }
    }
}

impl SessionConfig {
    /// Build a config, clamping every field to at least 1.
    pub fn new(work_secs: f64, break_secs: f64, total_rounds: u32) -> Self {
        Self {
            work_secs,
            break_secs,
            total_rounds,
        }
        .clamped()
    }

    /// Strict check used by callers that want to report bad input instead of fixing it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_secs("work_secs", self.work_secs)?;
        check_secs("break_secs", self.break_secs)?;
        if !(1..=MAX_ROUNDS).contains(&self.total_rounds) {
            return Err(ValidationError::InvalidValue {
                field: "total_rounds".into(),
                message: format!("must be between 1 and {MAX_ROUNDS}, got {}", self.total_rounds),
            });
        }
        Ok(())
    }

    /// Copy with every field raised to at least 1 and capped at
    /// [`MAX_PHASE_SECS`] / [`MAX_ROUNDS`]; non-finite durations become 1.
    ///
    /// A zero-length phase would complete on every tick, so the engine never
    /// accepts one.
    pub fn clamped(&self) -> Self {
        let out = Self {
            work_secs: clamp_secs(self.work_secs),
            break_secs: clamp_secs(self.break_secs),
            total_rounds: self.total_rounds.clamp(1, MAX_ROUNDS),
        };
        if out != *self {
            warn!(requested = ?self, clamped = ?out, "session config clamped");
        }
        out
    }

    /// Length of a phase; `Completed` reports the work length it finished on.
    pub fn duration_secs(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Work | Phase::Completed => self.work_secs,
            Phase::Break => self.break_secs,
        }
    }

    /// Saturates instead of panicking when the fields were set directly
    /// without clamping.
    pub fn duration(&self, phase: Phase) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs(phase).max(0.0)).unwrap_or(Duration::MAX)
    }

    /// Full session length: every work phase plus the breaks between them.
    pub fn total_secs(&self) -> f64 {
        let rounds = self.total_rounds as f64;
        self.work_secs * rounds + self.break_secs * (rounds - 1.0).max(0.0)
    }

    /// Every phase the session passes through, in order. The round count is
    /// bounded by [`MAX_ROUNDS`] even if the field was set directly.
    pub fn plan(&self) -> Vec<PlannedPhase> {
        let total_rounds = self.total_rounds.clamp(1, MAX_ROUNDS);
        let mut steps = Vec::with_capacity(total_rounds as usize * 2);
        let mut offset = 0.0;
        for round in 1..=total_rounds {
            steps.push(PlannedPhase {
                phase: Phase::Work,
                round,
                starts_at_secs: offset,
                duration_secs: self.work_secs,
            });
            offset += self.work_secs;
            if round < total_rounds {
                steps.push(PlannedPhase {
                    phase: Phase::Break,
                    round,
                    starts_at_secs: offset,
                    duration_secs: self.break_secs,
                });
                offset += self.break_secs;
            }
        }
        steps
    }
}

/// One entry of [`SessionConfig::plan`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedPhase {
    pub phase: Phase,
    pub round: u32,
    pub starts_at_secs: f64,
    pub duration_secs: f64,
}

fn clamp_secs(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.clamp(MIN_FIELD, MAX_PHASE_SECS)
    } else {
        MIN_FIELD
    }
}

fn check_secs(field: &str, secs: f64) -> Result<(), ValidationError> {
    if !secs.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: field.into(),
            message: format!("'{secs}' is not a number of seconds"),
        });
    }
    if secs < MIN_FIELD {
        return Err(ValidationError::InvalidValue {
            field: field.into(),
            message: format!("must be at least {MIN_FIELD} second, got {secs}"),
        });
    }
    if secs > MAX_PHASE_SECS {
        return Err(ValidationError::InvalidValue {
            field: field.into(),
            message: format!("must be at most {MAX_PHASE_SECS} seconds, got {secs}"),
        });
    }
    Ok(())
}
