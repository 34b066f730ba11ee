//! Build pipeline: configuration snapshot -> selection -> plan.
//!
//! [`build_workout`] is pure apart from the caller's RNG. It either returns a
//! complete [`BuiltWorkout`] or a [`ConfigurationError`] and never touches an
//! installed plan.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigurationError;
use crate::exercise::{normalize, ExercisePool, ExerciseRecord};
use crate::plan::{
    build_circuit_plan, build_tabata_plan, ensure_set_timings, suggested_slot_seconds, summarize,
    Plan, PlanSummary, TimingSpec,
};
use crate::preset::{PresetKey, Structure};
use crate::select::{select_balanced, select_from_group, select_tabata_pairs, TABATA_EXERCISES};

/// Group filter value meaning "balanced across all groups".
pub const ANY_GROUP: &str = "any";

pub const MAX_EXERCISE_COUNT: usize = 100;
pub const MAX_SET_COUNT: usize = 100;

/// Everything the user configured for one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutRequest {
    pub total_minutes: f64,
    pub exercise_count: usize,
    pub set_count: usize,
    pub ready_seconds: u32,
    pub default_rest_seconds: u32,
    /// `any` or a group name.
    pub group: String,
    /// Per-set overrides; missing sets are filled from the suggested slot.
    pub set_timings: Vec<TimingSpec>,
    pub preset: PresetKey,
}

impl Default for WorkoutRequest {
    fn default() -> Self {
        Self {
            total_minutes: 12.0,
            exercise_count: 4,
            set_count: 3,
            ready_seconds: 15,
            default_rest_seconds: 25,
            group: ANY_GROUP.to_string(),
            set_timings: Vec::new(),
            preset: PresetKey::Custom,
        }
    }
}

impl WorkoutRequest {
    /// Overwrite the preset's fields. Ready seconds and group stay as they are.
    pub fn apply_preset(&mut self, key: PresetKey) {
        self.preset = key;
        let Some(preset) = key.preset() else {
            return;
        };
        self.total_minutes = preset.total_minutes;
        self.exercise_count = preset.exercise_count;
        self.set_count = preset.set_count;
        self.default_rest_seconds = preset.default_rest_seconds;
        self.set_timings = preset.set_timings;
    }

    pub fn group_filter(&self) -> Option<String> {
        let group = normalize(&self.group);
        (!group.is_empty() && group != ANY_GROUP).then_some(group)
    }

    /// Per-set timings the build will use.
    pub fn resolved_timings(&self) -> Vec<TimingSpec> {
        let suggested =
            suggested_slot_seconds(self.total_minutes, self.exercise_count, self.set_count);
        ensure_set_timings(
            &self.set_timings,
            self.set_count,
            suggested,
            self.default_rest_seconds,
        )
    }

    /// Preview numbers for the current values.
    pub fn summary(&self) -> PlanSummary {
        summarize(
            self.total_minutes,
            self.exercise_count,
            self.ready_seconds,
            &self.resolved_timings(),
        )
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltWorkout {
    pub preset: PresetKey,
    /// Selected exercises in circuit order (the six pair members for Tabata).
    pub exercises: Vec<ExerciseRecord>,
    /// Empty for Tabata.
    pub timings: Vec<TimingSpec>,
    pub summary: PlanSummary,
    pub plan: Plan,
}

pub fn build_workout<R: Rng + ?Sized>(
    pool: &ExercisePool,
    request: &WorkoutRequest,
    rng: &mut R,
) -> Result<BuiltWorkout, ConfigurationError> {
    if pool.is_empty() {
        return Err(ConfigurationError::NoExercises);
    }

    let mut request = request.clone();
    request.apply_preset(request.preset);
    let preset = request.preset.preset();
    let group = request.group_filter();

    if preset.as_ref().map(|p| p.structure) == Some(Structure::Tabata) {
        return build_tabata(pool, &request, group, rng);
    }

    let filtered;
    let pool = match preset.as_ref().and_then(|p| p.excluded_group.map(|g| (p.label, g))) {
        Some((label, excluded)) => {
            if group.as_deref() == Some(excluded) {
                return Err(ConfigurationError::GroupExcludedByPreset {
                    preset: label.to_string(),
                    group: excluded.to_string(),
                });
            }
            filtered = pool.excluding_group(excluded);
            &filtered
        }
        None => pool,
    };

    let n = request.exercise_count;
    let sets = request.set_count;
    check_count("exercise_count", n, MAX_EXERCISE_COUNT)?;
    check_count("set_count", sets, MAX_SET_COUNT)?;

    let available = pool.unique_count(group.as_deref());
    if available < n {
        return Err(ConfigurationError::NotEnoughExercises {
            requested: n,
            available,
        });
    }

    let exercises = match group.as_deref() {
        Some(g) => select_from_group(n, pool, g, rng),
        None => select_balanced(n, pool, rng),
    };
    if exercises.len() < n {
        return Err(ConfigurationError::SelectionShort {
            requested: n,
            picked: exercises.len(),
        });
    }

    let timings = request.resolved_timings();
    let plan = build_circuit_plan(n, sets, request.ready_seconds, &exercises, &timings)?;
    let summary = summarize(request.total_minutes, n, request.ready_seconds, &timings);
    info!(
        preset = %request.preset,
        exercises = n,
        sets,
        blocks = plan.len(),
        total_seconds = plan.total_seconds(),
        "workout built"
    );

    Ok(BuiltWorkout {
        preset: request.preset,
        exercises,
        timings,
        summary,
        plan,
    })
}

fn check_count(field: &str, value: usize, max: usize) -> Result<(), ConfigurationError> {
    if (1..=max).contains(&value) {
        return Ok(());
    }
    Err(ConfigurationError::InvalidValue {
        field: field.into(),
        message: format!("must be between 1 and {max}, got {value}"),
    })
}

fn build_tabata<R: Rng + ?Sized>(
    pool: &ExercisePool,
    request: &WorkoutRequest,
    group: Option<String>,
    rng: &mut R,
) -> Result<BuiltWorkout, ConfigurationError> {
    if let Some(group) = group {
        return Err(ConfigurationError::GroupFilterUnsupported {
            preset: "Tabata".into(),
            group,
        });
    }

    let available = pool.unique_count(None);
    if available < TABATA_EXERCISES {
        return Err(ConfigurationError::NotEnoughExercises {
            requested: TABATA_EXERCISES,
            available,
        });
    }

    let selection =
        select_tabata_pairs(pool, rng).ok_or(ConfigurationError::TabataPairingFailed)?;
    let plan = build_tabata_plan(request.ready_seconds, &selection)?;
    let work_seconds = plan
        .blocks()
        .iter()
        .filter(|b| b.kind.is_work())
        .map(|b| u64::from(b.seconds))
        .sum();
    let summary = PlanSummary {
        target_seconds: work_seconds,
        planned_work_seconds: work_seconds,
        session_seconds: plan.total_seconds(),
    };
    info!(blocks = plan.len(), total_seconds = plan.total_seconds(), "tabata built");

    Ok(BuiltWorkout {
        preset: PresetKey::Tabata,
        exercises: selection.six,
        timings: Vec::new(),
        summary,
        plan,
    })
}
