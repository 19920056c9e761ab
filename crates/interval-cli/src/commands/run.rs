//! Foreground session: drives the runner, reads line commands from stdin,
//! renders updates and plays tones on phase boundaries.

use std::time::Duration;

use clap::Args;
use interval_core::runner::{self, RunnerHandle};
use interval_core::{
    notify, Config, CoreError, Event, Notifier, Phase, SessionConfig, SoundKind, TimerEngine,
    TokioClock, Update,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::SessionArgs;
use crate::render::Renderer;
use crate::sound;

const HELP: &str =
    "keys: s start | p pause | <enter> toggle | r reset | set work|break|rounds N | q quit";

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Print every snapshot and event as a JSON line
    #[arg(long)]
    pub json: bool,
    /// Sound for phase boundaries: bell, audio or silent
    #[arg(long)]
    pub sound: Option<SoundKind>,
    /// Wait for `s` instead of starting right away
    #[arg(long)]
    pub paused: bool,
}

/// A parsed stdin line.
#[derive(Debug, Clone, PartialEq)]
enum Input {
    Start,
    Pause,
    Toggle,
    Reset,
    Set(Field, f64),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Work,
    Break,
    Rounds,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let input = match words.next() {
        None => Input::Toggle,
        Some("s" | "start") => Input::Start,
        Some("p" | "pause") => Input::Pause,
        Some("t" | "toggle") => Input::Toggle,
        Some("r" | "reset") => Input::Reset,
        Some("q" | "quit" | "exit") => Input::Quit,
        Some("set") => {
            let field = match words.next()? {
                "work" | "w" => Field::Work,
                "break" | "b" => Field::Break,
                "rounds" | "r" => Field::Rounds,
                _ => return None,
            };
            let value = words.next()?.parse::<f64>().ok()?;
            Input::Set(field, value)
        }
        Some(_) => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some(input)
}

/// Same clamping as the config form: everything at least 1.
fn apply_field(config: SessionConfig, field: Field, value: f64) -> SessionConfig {
    match field {
        Field::Work => SessionConfig::new(value, config.break_secs, config.total_rounds),
        Field::Break => SessionConfig::new(config.work_secs, value, config.total_rounds),
        Field::Rounds => {
            let rounds = if value.is_finite() { value.max(1.0).round() as u32 } else { 1 };
            SessionConfig::new(config.work_secs, config.break_secs, rounds)
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let session = args.session.resolve(config.session);
    let sound = args.sound.unwrap_or(config.notifications.sound);
    let notifier = sound::notifier(sound, config.notifications.enabled);
    let period = config.display.tick_interval();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(drive(session, period, notifier.as_ref(), args.json, !args.paused));
    // stdin is read on a blocking thread that may still be parked on a read.
    rt.shutdown_background();
    result
}

async fn drive(
    session: SessionConfig,
    period: Duration,
    notifier: &dyn Notifier,
    json: bool,
    autostart: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = TimerEngine::with_clock(session, TokioClock::new());
    let (handle, mut updates, task) = runner::spawn(engine, period);
    let mut renderer = Renderer::stdout(json);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut session = session;

    renderer.message(HELP)?;
    if autostart {
        handle.start().await?;
    } else {
        renderer.render(&Update::Snapshot(handle.snapshot().await?))?;
    }

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    match parse_input(&line) {
                        Some(Input::Quit) => break,
                        Some(input) => {
                            if let Some(msg) = apply(&handle, &mut session, input).await? {
                                renderer.message(&msg)?;
                            }
                        }
                        None => renderer.message(HELP)?,
                    }
                }
                Ok(None) | Err(_) => {
                    debug!("stdin closed, no more commands");
                    stdin_open = false;
                }
            },
            update = updates.recv() => {
                let Some(update) = update else { break };
                if let Update::Event(event) = &update {
                    notify(notifier, event);
                }
                renderer.render(&update)?;
                if matches!(update, Update::Event(Event::SessionCompleted { .. })) {
                    break;
                }
            }
        }
    }

    renderer.finish()?;
    drop(handle);
    task.await?;
    Ok(())
}

/// Send one command to the runner. Returns a message for the user when the
/// command was refused.
async fn apply(
    handle: &RunnerHandle,
    session: &mut SessionConfig,
    input: Input,
) -> Result<Option<String>, CoreError> {
    match input {
        Input::Start => {
            let started = handle.start().await?;
            if started.is_none() && handle.snapshot().await?.phase == Phase::Completed {
                return Ok(Some("session finished, reset first".into()));
            }
        }
        Input::Pause => {
            handle.pause().await?;
        }
        Input::Toggle => {
            handle.toggle().await?;
        }
        Input::Reset => {
            handle.reset().await?;
        }
        Input::Set(field, value) => {
            let next = apply_field(*session, field, value);
            match handle.reconfigure(next).await {
                Ok(_) => *session = next,
                Err(CoreError::ConfigLocked) => {
                    return Ok(Some("pause the timer before changing the session".into()));
                }
                Err(e) => return Err(e),
            }
        }
        Input::Quit => {}
    }
    Ok(None)
}
