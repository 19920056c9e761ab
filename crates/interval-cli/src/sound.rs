//! Picks the notifier for the configured sound.

use interval_core::notify::{Silent, TerminalBell};
use interval_core::{Notifier, SoundKind};

pub fn notifier(kind: SoundKind, enabled: bool) -> Box<dyn Notifier> {
    if !enabled {
        return Box::new(Silent);
    }
    match kind {
        SoundKind::Bell => Box::new(TerminalBell),
        SoundKind::Silent => Box::new(Silent),
        SoundKind::Audio => audio_notifier(),
    }
}

#[cfg(feature = "audio")]
fn audio_notifier() -> Box<dyn Notifier> {
    Box::new(audio::SineTones)
}

#[cfg(not(feature = "audio"))]
fn audio_notifier() -> Box<dyn Notifier> {
    tracing::warn!("built without the `audio` feature, using the terminal bell");
    Box::new(TerminalBell)
}

#[cfg(feature = "audio")]
mod audio {
    use interval_core::{Notifier, NotifyError, Tone};
    use rodio::source::{SineWave, Source};
    use rodio::{OutputStream, Sink};
    use tracing::warn;

    const VOLUME: f32 = 0.2;

    /// Plays each tone on its own short-lived thread so the timer loop never waits.
    pub struct SineTones;

    impl Notifier for SineTones {
        fn play(&self, tone: Tone) -> Result<(), NotifyError> {
            std::thread::Builder::new()
                .name("interval-tone".into())
                .spawn(move || {
                    if let Err(e) = play_blocking(tone) {
                        warn!(error = %e, "tone playback failed");
                    }
                })?;
            Ok(())
        }
    }

    fn play_blocking(tone: Tone) -> Result<(), NotifyError> {
        let (_stream, handle) =
            OutputStream::try_default().map_err(|e| NotifyError::NoDevice(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| NotifyError::Playback(e.to_string()))?;
        sink.append(
            SineWave::new(tone.frequency_hz)
                .take_duration(tone.duration)
                .amplify(VOLUME),
        );
        sink.sleep_until_end();
        Ok(())
    }
}
