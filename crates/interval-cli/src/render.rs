//! Terminal output for a running session.

use std::io::{self, Write};

use interval_core::{Event, Phase, Snapshot, Update};

const BAR_WIDTH: usize = 30;

/// `m:ss`, rounding down to whole seconds.
pub fn fmt_clock(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

/// One redrawable status line.
pub fn status_line(snap: &Snapshot) -> String {
    let done = snap.phase == Phase::Completed || snap.progress >= 1.0;
    let state = if snap.is_running || done {
        ""
    } else {
        " (paused)"
    };
    format!(
        "{:<5} {}/{} [{}] {} left{}",
        snap.phase.label(),
        snap.current_round,
        snap.total_rounds,
        progress_bar(snap.progress, BAR_WIDTH),
        fmt_clock(snap.remaining_secs.ceil()),
        state,
    )
}

/// Message for events worth a line of their own.
pub fn event_line(event: &Event) -> Option<String> {
    match event {
        Event::PhaseCompleted { phase, round, .. } => Some(format!("{phase} {round} done")),
        Event::SessionCompleted { total_rounds, .. } => {
            Some(format!("Session complete: {total_rounds} rounds"))
        }
        Event::TimerReset { .. } => Some("Reset".to_string()),
        Event::Reconfigured { config, .. } => Some(format!(
            "Now {} work / {} break x {}",
            fmt_clock(config.work_secs),
            fmt_clock(config.break_secs),
            config.total_rounds
        )),
        _ => None,
    }
}

pub struct Renderer<W: Write> {
    out: W,
    json: bool,
    /// A status line is on screen without a trailing newline.
    dirty: bool,
}

impl Renderer<io::Stdout> {
    pub fn stdout(json: bool) -> Self {
        Self::new(io::stdout(), json)
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            dirty: false,
        }
    }

    pub fn render(&mut self, update: &Update) -> io::Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, update)?;
            writeln!(self.out)?;
            return self.out.flush();
        }

        match update {
            Update::Snapshot(snap) => {
                write!(self.out, "\r\x1b[2K{}", status_line(snap))?;
                self.dirty = true;
            }
            Update::Event(event) => {
                if let Some(line) = event_line(event) {
                    self.end_line()?;
                    writeln!(self.out, "{line}")?;
                }
            }
        }
        self.out.flush()
    }

    /// Free-form message that does not break the status line.
    pub fn message(&mut self, msg: &str) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        self.end_line()?;
        writeln!(self.out, "{msg}")?;
        self.out.flush()
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.end_line()?;
        self.out.flush()
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.dirty {
            writeln!(self.out)?;
            self.dirty = false;
        }
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
