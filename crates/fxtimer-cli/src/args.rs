//! Shared flags for commands that load data or build a workout.

use std::path::PathBuf;

use clap::Args;
use fxtimer_core::{Config, CsvSource, PresetKey, RemoteSource, WorkoutRequest};

#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Local exercises CSV instead of the published table
    #[arg(long, value_name = "FILE")]
    pub exercises: Option<PathBuf>,
    /// Local settings CSV naming the groups (used with --exercises)
    #[arg(long, value_name = "FILE", requires = "exercises")]
    pub settings: Option<PathBuf>,
}

impl DataArgs {
    /// Local files when given, otherwise both configured URLs.
    pub fn load(&self, config: &Config) -> Result<CsvSource, Box<dyn std::error::Error>> {
        if let Some(exercises) = &self.exercises {
            return Ok(CsvSource::from_files(self.settings.as_deref(), exercises)?);
        }

        let remote = RemoteSource::new(&config.source.settings_url, &config.source.exercises_url)?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(rt.block_on(remote.load())?)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct WorkoutArgs {
    #[command(flatten)]
    pub data: DataArgs,
    /// custom, keops, 30x30x4, 30x30x6, cambalache, area51 or tabata
    #[arg(long)]
    pub preset: Option<PresetKey>,
    /// Exercises per set (ignored with a preset)
    #[arg(short = 'n', long = "count")]
    pub count: Option<usize>,
    /// Number of sets (ignored with a preset)
    #[arg(long)]
    pub sets: Option<usize>,
    /// Target session length in minutes (ignored with a preset)
    #[arg(long)]
    pub minutes: Option<f64>,
    /// Default rest seconds per slot (ignored with a preset)
    #[arg(long)]
    pub rest: Option<u32>,
    /// Lead-in seconds before the first block
    #[arg(long)]
    pub ready: Option<u32>,
    /// Muscle group, or "any" for balanced rotation
    #[arg(long)]
    pub group: Option<String>,
    /// Seed for a reproducible selection
    #[arg(long)]
    pub seed: Option<u64>,
    /// Do not ring the terminal bell
    #[arg(long)]
    pub no_sound: bool,
}

impl WorkoutArgs {
    /// Config values with command-line overrides on top.
    ///
    /// Changing the shape of the circuit drops the saved per-set timings so
    /// they are recomputed from the new numbers.
    pub fn request(&self, config: &Config) -> WorkoutRequest {
        let mut request = config.workout_request();
        if let Some(preset) = self.preset {
            request.apply_preset(preset);
        }

        let reshaped = self.count.is_some()
            || self.sets.is_some()
            || self.minutes.is_some()
            || self.rest.is_some();
        if reshaped {
            request.set_timings.clear();
        }
        if let Some(n) = self.count {
            request.exercise_count = n;
        }
        if let Some(sets) = self.sets {
            request.set_count = sets;
        }
        if let Some(minutes) = self.minutes {
            request.total_minutes = minutes;
        }
        if let Some(rest) = self.rest {
            request.default_rest_seconds = rest;
        }
        if let Some(ready) = self.ready {
            request.ready_seconds = ready;
        }
        if let Some(group) = &self.group {
            request.group = group.clone();
        }
        request
    }

    pub fn seed(&self, config: &Config) -> Option<u64> {
        self.seed.or(config.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_config() {
        let mut config = Config::default();
        config.workout.set_timings = vec![fxtimer_core::TimingSpec::with_work(60, 30)];
        let args = WorkoutArgs {
            count: Some(6),
            group: Some("legs".into()),
            ready: Some(0),
            ..WorkoutArgs::default()
        };
        let request = args.request(&config);
        assert_eq!(request.exercise_count, 6);
        assert_eq!(request.group, "legs");
        assert_eq!(request.ready_seconds, 0);
        assert!(request.set_timings.is_empty());
    }

    #[test]
    fn preset_replaces_form_values() {
        let args = WorkoutArgs {
            preset: Some(PresetKey::Cambalache),
            ..WorkoutArgs::default()
        };
        let request = args.request(&Config::default());
        assert_eq!(request.preset, PresetKey::Cambalache);
        assert_eq!(request.exercise_count, 12);
        assert_eq!(request.set_count, 1);
    }

    #[test]
    fn seed_falls_back_to_config() {
        let mut config = Config::default();
        config.seed = Some(5);
        assert_eq!(WorkoutArgs::default().seed(&config), Some(5));
        let args = WorkoutArgs {
            seed: Some(9),
            ..WorkoutArgs::default()
        };
        assert_eq!(args.seed(&config), Some(9));
    }
}
