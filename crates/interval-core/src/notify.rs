//! Tone cues for phase boundaries.
//!
//! The engine never waits on or hears back from a notifier. `notify` logs a
//! failed tone and moves on.

use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::Event;
use crate::timer::Phase;

/// A beep to play.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
}

/// Which boundary a tone marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    WorkEnd,
    BreakEnd,
    SessionEnd,
}

impl Cue {
    /// Lower tone when work ends, higher when a break ends, highest and
    /// longest when the session is over.
    pub fn tone(self) -> Tone {
        let (frequency_hz, ms) = match self {
            Cue::WorkEnd => (600.0, 200),
            Cue::BreakEnd => (1000.0, 300),
            Cue::SessionEnd => (1200.0, 500),
        };
        Tone {
            frequency_hz,
            duration: Duration::from_millis(ms),
        }
    }

    pub fn for_event(event: &Event) -> Option<Cue> {
        match event {
            Event::PhaseCompleted {
                phase: Phase::Work, ..
            } => Some(Cue::WorkEnd),
            Event::PhaseCompleted {
                phase: Phase::Break, ..
            } => Some(Cue::BreakEnd),
            Event::SessionCompleted { .. } => Some(Cue::SessionEnd),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("no audio output available: {0}")]
    NoDevice(String),

    #[error("tone playback failed: {0}")]
    Playback(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Notifier {
    fn play(&self, tone: Tone) -> Result<(), NotifyError>;
}

/// Play the cue for `event`, if it has one. Failures are logged, never returned.
pub fn notify(notifier: &dyn Notifier, event: &Event) {
    let Some(cue) = Cue::for_event(event) else {
        return;
    };
    let tone = cue.tone();
    match notifier.play(tone) {
        Ok(()) => debug!(?cue, hz = tone.frequency_hz, "tone played"),
        Err(e) => warn!(?cue, error = %e, "tone failed"),
    }
}

/// Rings the terminal bell. Pitch and length are up to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn play(&self, _tone: Tone) -> Result<(), NotifyError> {
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {
    fn play(&self, _tone: Tone) -> Result<(), NotifyError> {
        Ok(())
    }
}
