use fxtimer_core::audio::SilentCuePlayer;
use fxtimer_core::plan::WorkListEntry;
use fxtimer_core::progress::format_clock;
use fxtimer_core::session::NullSink;
use fxtimer_core::{BlockKind, BuiltWorkout, Config, Session};
use serde::Serialize;

use crate::args::WorkoutArgs;

#[derive(Serialize)]
struct PlanOutput<'a> {
    #[serde(flatten)]
    workout: &'a BuiltWorkout,
    total_seconds: u64,
    work_list: Vec<WorkListEntry>,
}

pub fn run(args: &WorkoutArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let source = args.data.load(&config)?;
    let request = args.request(&config);

    let mut session = Session::new(Box::new(SilentCuePlayer), Box::new(NullSink));
    if let Some(seed) = args.seed(&config) {
        session = session.with_seed(seed);
    }
    session.load(&source)?;
    let built = session.build(&request)?;

    if json {
        let output = PlanOutput {
            workout: built,
            total_seconds: built.plan.total_seconds(),
            work_list: built.plan.work_list(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let summary = &built.summary;
    println!("Preset:   {}", built.preset);
    println!(
        "Target:   {}   Planned work: {}   Session: {}",
        format_clock(summary.target_seconds),
        format_clock(summary.planned_work_seconds),
        format_clock(summary.session_seconds)
    );
    if !built.timings.is_empty() {
        let timings: Vec<String> = built
            .timings
            .iter()
            .enumerate()
            .map(|(i, t)| format!("set {}: {}s work / {}s rest", i + 1, t.work, t.rest))
            .collect();
        println!("Timings:  {}", timings.join(", "));
    }
    println!();

    for (i, block) in built.plan.blocks().iter().enumerate() {
        let kind = match block.kind {
            BlockKind::Ready => "ready",
            BlockKind::Work => "work",
            BlockKind::Rest => "rest",
            BlockKind::BetweenSets => "set break",
        };
        let name = if block.kind.is_work() {
            block.exercise.name.as_str()
        } else {
            ""
        };
        println!("{:>3}  {:<9} {:>4}s  {}", i + 1, kind, block.seconds, name);
    }
    println!();

    for entry in built.plan.work_list() {
        println!("{}", entry.label);
    }
    println!(
        "Total: {} in {} blocks",
        format_clock(built.plan.total_seconds()),
        built.plan.len()
    );
    Ok(())
}
