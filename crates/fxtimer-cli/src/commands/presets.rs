use fxtimer_core::preset::{catalog, Structure};

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let presets = catalog();
    if json {
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }

    for p in &presets {
        let timings = match p.structure {
            Structure::Tabata => "3 sets x 4 rounds of 20/10, pairs of mixed groups".to_string(),
            Structure::Circuit => p
                .set_timings
                .iter()
                .map(|t| format!("{}/{}/{}", t.slot, t.work, t.rest))
                .collect::<Vec<_>>()
                .join(", "),
        };
        let mut line = format!(
            "{:<11} {:<11} N={:<2} sets={}  {}",
            p.key.as_str(),
            p.label,
            p.exercise_count,
            p.set_count,
            timings
        );
        if let Some(group) = p.excluded_group {
            line.push_str(&format!("  (no {group})"));
        }
        println!("{line}");
    }
    Ok(())
}
