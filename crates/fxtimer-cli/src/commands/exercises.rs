use fxtimer_core::{Config, ExerciseSource};

use crate::args::DataArgs;

pub fn run_exercises(data: &DataArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let source = data.load(&config)?;
    let exercises = source.list_enabled_exercises()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exercises)?);
        return Ok(());
    }

    if exercises.is_empty() {
        println!("No enabled exercises found.");
        return Ok(());
    }
    for e in &exercises {
        println!("{:<8} {}", e.group, e.name);
    }
    println!("Loaded {} enabled exercises.", exercises.len());
    Ok(())
}

pub fn run_groups(data: &DataArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let groups = data.load(&config)?.list_groups()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        println!("any");
        for g in &groups {
            println!("{g}");
        }
    }
    Ok(())
}
