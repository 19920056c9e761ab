pub mod config;
pub mod plan;
pub mod run;

use clap::Args;
use interval_core::SessionConfig;

/// Session overrides shared by `run` and `plan`. Anything left out comes from
/// the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Work phase length in seconds
    #[arg(short, long)]
    pub work: Option<f64>,
    /// Break phase length in seconds
    #[arg(short, long = "break")]
    pub brk: Option<f64>,
    /// Number of rounds
    #[arg(short, long)]
    pub rounds: Option<u32>,
}

impl SessionArgs {
    /// Apply the flags on top of `base`. Values below 1 are raised to 1.
    pub fn resolve(&self, base: SessionConfig) -> SessionConfig {
        SessionConfig::new(
            self.work.unwrap_or(base.work_secs),
            self.brk.unwrap_or(base.break_secs),
            self.rounds.unwrap_or(base.total_rounds),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_and_clamp() {
        let args = SessionArgs {
            work: Some(45.0),
            brk: Some(0.0),
            rounds: None,
        };
        let cfg = args.resolve(SessionConfig::default());
        assert_eq!(cfg, SessionConfig::new(45.0, 1.0, 3));
    }

    #[test]
    fn no_flags_keeps_base() {
        let base = SessionConfig::new(10.0, 5.0, 8);
        assert_eq!(SessionArgs::default().resolve(base), base);
    }
}
