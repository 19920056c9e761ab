mod clock;
mod engine;
mod session;

pub use clock::{Clock, ManualClock, MonotonicClock, TokioClock};
pub use engine::{Status, Tick, TimerEngine, TimerState};
pub use session::{Phase, PlannedPhase, SessionConfig, MAX_PHASE_SECS, MAX_ROUNDS, MIN_FIELD};
