use clap::Args;
use interval_core::{Config, Phase};

use super::SessionArgs;
use crate::render::fmt_clock;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let session = args.session.resolve(config.session);
    let plan = session.plan();

    if args.json {
        let out = serde_json::json!({
            "config": session,
            "total_secs": session.total_secs(),
            "phases": plan,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (i, step) in plan.iter().enumerate() {
        let end = step.starts_at_secs + step.duration_secs;
        println!(
            "{:>3}. {:<5} round {:<3} {:>6} -> {:<6} ({})",
            i + 1,
            step.phase.label(),
            step.round,
            fmt_clock(step.starts_at_secs),
            fmt_clock(end),
            fmt_clock(step.duration_secs),
        );
    }
    let breaks = plan.iter().filter(|s| s.phase == Phase::Break).count();
    println!(
        "total {} ({} rounds, {} breaks)",
        fmt_clock(session.total_secs()),
        session.total_rounds,
        breaks
    );
    Ok(())
}
