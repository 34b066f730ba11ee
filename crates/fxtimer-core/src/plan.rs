//! Workout plans: the ordered block sequence a session runs through.
//!
//! Builders are pure: the same selection and timings always give the same
//! plan. The random part happens upstream in [`crate::select`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::exercise::ExerciseRecord;
use crate::select::TabataSelection;

pub const TABATA_SETS: usize = 3;
pub const TABATA_ROUNDS: usize = 4;
pub const TABATA_WORK_SECONDS: u32 = 20;
pub const TABATA_REST_SECONDS: u32 = 10;
pub const TABATA_BETWEEN_SETS_SECONDS: u32 = 15;

pub const MIN_SLOT_SECONDS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Ready,
    Work,
    Rest,
    BetweenSets,
}

impl BlockKind {
    pub fn is_work(self) -> bool {
        self == BlockKind::Work
    }
}

/// One atomic timed phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub seconds: u32,
    pub exercise: ExerciseRecord,
    /// `None` for the ready block.
    pub set_index: Option<usize>,
    /// Position of the exercise within its set; `None` outside a slot.
    pub slot_index: Option<usize>,
    pub total_exercises: usize,
    pub total_sets: usize,
}

impl Block {
    pub fn new(kind: BlockKind, seconds: u32, exercise: ExerciseRecord) -> Self {
        Self {
            kind,
            seconds,
            exercise,
            set_index: None,
            slot_index: None,
            total_exercises: 0,
            total_sets: 0,
        }
    }

    fn ready(seconds: u32, total_exercises: usize, total_sets: usize) -> Self {
        Self {
            total_exercises,
            total_sets,
            ..Self::new(
                BlockKind::Ready,
                seconds,
                ExerciseRecord::placeholder("Get ready", "Get into position."),
            )
        }
    }

    fn in_slot(
        kind: BlockKind,
        seconds: u32,
        exercise: &ExerciseRecord,
        set: usize,
        slot: usize,
        total_exercises: usize,
        total_sets: usize,
    ) -> Self {
        Self {
            kind,
            seconds,
            exercise: exercise.clone(),
            set_index: Some(set),
            slot_index: Some(slot),
            total_exercises,
            total_sets,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        u64::from(self.seconds).saturating_mul(1000)
    }
}

/// Immutable ordered block sequence for one built workout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    blocks: Vec<Block>,
}

/// Row of the work-only listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkListEntry {
    pub plan_index: usize,
    pub label: String,
}

impl Plan {
    /// Wrap hand-made blocks. Every block must last at least one second.
    pub fn new(blocks: Vec<Block>) -> Result<Self, ConfigurationError> {
        if let Some(pos) = blocks.iter().position(|b| b.seconds == 0) {
            return Err(ConfigurationError::InvalidValue {
                field: format!("blocks[{pos}].seconds"),
                message: "must be greater than 0".into(),
            });
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn total_seconds(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.seconds)).sum()
    }

    /// Seconds of all blocks strictly before `index`.
    pub fn cumulative_seconds(&self, index: usize) -> u64 {
        self.blocks
            .iter()
            .take(index)
            .map(|b| u64::from(b.seconds))
            .sum()
    }

    pub fn count_kind(&self, kind: BlockKind) -> usize {
        self.blocks.iter().filter(|b| b.kind == kind).count()
    }

    /// First named work exercise at or after `from`.
    pub fn next_work_exercise(&self, from: usize) -> Option<&ExerciseRecord> {
        self.blocks
            .iter()
            .skip(from)
            .find(|b| b.kind.is_work() && !b.exercise.name.is_empty())
            .map(|b| &b.exercise)
    }

    /// Work blocks only, labelled for the workout list.
    pub fn work_list(&self) -> Vec<WorkListEntry> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.kind.is_work())
            .map(|(plan_index, b)| {
                let set = b.set_index.map(|s| s + 1).unwrap_or(0);
                let slot = b.slot_index.map(|s| s + 1).unwrap_or(0);
                let mut label = format!(
                    "Set {set}/{}. Ex {slot}/{}. {}",
                    b.total_sets, b.total_exercises, b.exercise.name
                );
                if !b.exercise.group.is_empty() {
                    label.push_str(&format!(" ({})", b.exercise.group));
                }
                WorkListEntry { plan_index, label }
            })
            .collect()
    }
}

/// Per-set timing: `work + rest == slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSpec {
    pub slot: u32,
    pub work: u32,
    pub rest: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingField {
    Slot,
    Work,
    Rest,
}

impl TimingSpec {
    /// Slot with the given work seconds; rest takes the remainder.
    pub fn with_work(slot: u32, work: u32) -> Self {
        let slot = slot.max(MIN_SLOT_SECONDS);
        let work = work.clamp(1, slot);
        Self {
            slot,
            work,
            rest: slot - work,
        }
    }

    /// Slot with the given rest seconds; at least one second of work remains.
    pub fn with_rest(slot: u32, rest: u32) -> Self {
        let slot = slot.max(MIN_SLOT_SECONDS);
        let rest = rest.min(slot - 1);
        let work = (slot - rest).max(1);
        Self {
            slot,
            work,
            rest: slot - work,
        }
    }

    /// Re-derive `rest` from `slot` and `work` after clamping.
    pub fn normalized(self) -> Self {
        Self::with_work(self.slot, self.work)
    }

    pub fn is_valid(&self) -> bool {
        self.slot >= MIN_SLOT_SECONDS
            && self.work >= 1
            && self.work <= self.slot
            && self.work + self.rest == self.slot
    }

    /// Apply a single-field edit, keeping the other fields consistent.
    ///
    /// A slot edit keeps rest (clamped below the slot), a work edit recomputes
    /// rest, a rest edit recomputes work.
    pub fn edit(self, field: TimingField, value: u32) -> Self {
        match field {
            TimingField::Slot => Self::with_rest(value, self.rest),
            TimingField::Work => Self::with_work(self.slot, value),
            TimingField::Rest => Self::with_rest(self.slot, value),
        }
    }
}

/// Even split of the target session length across every exercise slot.
pub fn suggested_slot_seconds(total_minutes: f64, exercises: usize, sets: usize) -> u32 {
    let total = (total_minutes * 60.0).round().max(1.0);
    let slots = (exercises * sets).max(1) as f64;
    ((total / slots).round() as u32).max(MIN_SLOT_SECONDS)
}

/// Per-set timings for `sets` sets: existing overrides are normalized and kept,
/// missing sets get the suggested slot split by the default rest.
pub fn ensure_set_timings(
    previous: &[TimingSpec],
    sets: usize,
    suggested_slot: u32,
    default_rest: u32,
) -> Vec<TimingSpec> {
    (0..sets)
        .map(|s| match previous.get(s) {
            Some(prev) => prev.normalized(),
            None => TimingSpec::with_rest(suggested_slot, default_rest),
        })
        .collect()
}

/// Numbers for the pre-build preview line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub target_seconds: u64,
    pub planned_work_seconds: u64,
    pub session_seconds: u64,
}

pub fn summarize(
    total_minutes: f64,
    exercises: usize,
    ready_seconds: u32,
    timings: &[TimingSpec],
) -> PlanSummary {
    let n = exercises as u64;
    PlanSummary {
        target_seconds: (total_minutes * 60.0).round().max(0.0) as u64,
        planned_work_seconds: timings.iter().map(|t| u64::from(t.work) * n).sum(),
        session_seconds: timings.iter().map(|t| u64::from(t.slot) * n).sum::<u64>()
            + u64::from(ready_seconds),
    }
}

/// Expand a circuit into blocks.
///
/// Every set runs the same exercise order. Each work block is followed by a
/// rest block except the last one of the last set; zero-second rests are
/// dropped.
pub fn build_circuit_plan(
    n: usize,
    sets: usize,
    ready_seconds: u32,
    exercises: &[ExerciseRecord],
    timings: &[TimingSpec],
) -> Result<Plan, ConfigurationError> {
    if n == 0 || exercises.len() != n {
        return Err(ConfigurationError::InvalidValue {
            field: "exercises".into(),
            message: format!("expected {n} exercises, got {}", exercises.len()),
        });
    }
    if sets == 0 || timings.len() != sets {
        return Err(ConfigurationError::InvalidValue {
            field: "set_timings".into(),
            message: format!("expected {sets} set timings, got {}", timings.len()),
        });
    }

    let mut blocks = Vec::with_capacity(1 + sets * n * 2);
    if ready_seconds > 0 {
        blocks.push(Block::ready(ready_seconds, n, sets));
    }

    for (s, timing) in timings.iter().enumerate() {
        let timing = timing.normalized();
        for (i, exercise) in exercises.iter().enumerate() {
            blocks.push(Block::in_slot(BlockKind::Work, timing.work, exercise, s, i, n, sets));

            let is_last_work = s == sets - 1 && i == n - 1;
            if !is_last_work && timing.rest > 0 {
                blocks.push(Block::in_slot(BlockKind::Rest, timing.rest, exercise, s, i, n, sets));
            }
        }
    }

    Ok(Plan { blocks })
}

/// Expand the fixed Tabata structure: three sets of four `a, b` rounds at
/// 20s work / 10s rest, a 15s break between sets, no trailing rest in a set.
pub fn build_tabata_plan(ready_seconds: u32, selection: &TabataSelection) -> Result<Plan, ConfigurationError> {
    if selection.pairs.len() != TABATA_SETS {
        return Err(ConfigurationError::InvalidValue {
            field: "pairs".into(),
            message: format!("expected {TABATA_SETS} pairs, got {}", selection.pairs.len()),
        });
    }

    let per_set = 2;
    let mut blocks = Vec::new();
    if ready_seconds > 0 {
        blocks.push(Block::ready(ready_seconds, per_set, TABATA_SETS));
    }

    for (s, (a, b)) in selection.pairs.iter().enumerate() {
        for round in 0..TABATA_ROUNDS {
            for (slot, exercise) in [a, b].into_iter().enumerate() {
                blocks.push(Block::in_slot(
                    BlockKind::Work,
                    TABATA_WORK_SECONDS,
                    exercise,
                    s,
                    slot,
                    per_set,
                    TABATA_SETS,
                ));

                let closes_set = round == TABATA_ROUNDS - 1 && slot == per_set - 1;
                if !closes_set {
                    blocks.push(Block::in_slot(
                        BlockKind::Rest,
                        TABATA_REST_SECONDS,
                        exercise,
                        s,
                        slot,
                        per_set,
                        TABATA_SETS,
                    ));
                }
            }
        }

        if s + 1 < TABATA_SETS {
            blocks.push(Block {
                set_index: Some(s),
                total_exercises: per_set,
                total_sets: TABATA_SETS,
                ..Block::new(
                    BlockKind::BetweenSets,
                    TABATA_BETWEEN_SETS_SECONDS,
                    ExerciseRecord::placeholder("Rest", "Shake it out."),
                )
            });
        }
    }

    Ok(Plan { blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(name: &str, group: &str) -> ExerciseRecord {
        ExerciseRecord::new(name, group)
    }

    fn tabata_selection() -> TabataSelection {
        let six = vec![
            ex("Push-up", "upper"),
            ex("Squat", "legs"),
            ex("Plank", "core"),
            ex("Dip", "upper"),
            ex("Lunge", "legs"),
            ex("Crunch", "core"),
        ];
        let pairs = six
            .chunks_exact(2)
            .map(|p| (p[0].clone(), p[1].clone()))
            .collect();
        TabataSelection { six, pairs }
    }

    #[test]
    fn circuit_two_by_two_has_no_trailing_rest() {
        let exercises = vec![ex("Squat", "legs"), ex("Push-up", "upper")];
        let timings = vec![TimingSpec::with_work(30, 20); 2];
        let plan = build_circuit_plan(2, 2, 15, &exercises, &timings).unwrap();

        let kinds: Vec<BlockKind> = plan.blocks().iter().map(|b| b.kind).collect();
        use BlockKind::*;
        assert_eq!(kinds, vec![Ready, Work, Rest, Work, Rest, Work, Rest, Work]);
        assert_eq!(plan.len(), 8);
        assert_eq!(plan.total_seconds(), 15 + 2 * (20 + 10 + 20 + 10) - 10);
    }

    #[test]
    fn circuit_without_ready_starts_with_work() {
        let exercises = vec![ex("Squat", "legs")];
        let timings = vec![TimingSpec::with_work(60, 40)];
        let plan = build_circuit_plan(1, 1, 0, &exercises, &timings).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.blocks()[0].kind, BlockKind::Work);
        assert_eq!(plan.blocks()[0].seconds, 40);
    }

    #[test]
    fn circuit_uses_per_set_timings() {
        let exercises = vec![ex("Squat", "legs"), ex("Row", "upper")];
        let timings = vec![TimingSpec::with_work(60, 30), TimingSpec::with_work(60, 45)];
        let plan = build_circuit_plan(2, 2, 0, &exercises, &timings).unwrap();
        let works: Vec<u32> = plan
            .blocks()
            .iter()
            .filter(|b| b.kind.is_work())
            .map(|b| b.seconds)
            .collect();
        assert_eq!(works, vec![30, 30, 45, 45]);
        let rest = &plan.blocks()[1];
        assert_eq!(rest.kind, BlockKind::Rest);
        assert_eq!(rest.exercise.name, "Squat");
        assert_eq!(rest.seconds, 30);
    }

    #[test]
    fn circuit_rejects_mismatched_inputs() {
        let exercises = vec![ex("Squat", "legs")];
        let timings = vec![TimingSpec::with_work(60, 30)];
        assert!(build_circuit_plan(2, 1, 0, &exercises, &timings).is_err());
        assert!(build_circuit_plan(1, 2, 0, &exercises, &timings).is_err());
    }

    #[test]
    fn circuit_drops_zero_rest() {
        let exercises = vec![ex("Squat", "legs"), ex("Row", "upper")];
        let timings = vec![TimingSpec::with_work(40, 40)];
        let plan = build_circuit_plan(2, 1, 0, &exercises, &timings).unwrap();
        assert_eq!(plan.count_kind(BlockKind::Rest), 0);
        assert!(plan.blocks().iter().all(|b| b.seconds > 0));
    }

    #[test]
    fn tabata_structure() {
        let plan = build_tabata_plan(10, &tabata_selection()).unwrap();
        assert_eq!(plan.blocks()[0].kind, BlockKind::Ready);
        assert_eq!(plan.count_kind(BlockKind::BetweenSets), 2);
        assert_eq!(plan.count_kind(BlockKind::Work), 24);
        // 1 ready + 3 sets * 15 timed blocks + 2 breaks
        assert_eq!(plan.len(), 1 + 3 * 15 + 2);
        assert_eq!(plan.blocks().last().unwrap().kind, BlockKind::Work);

        let first_set: Vec<&Block> = plan.blocks()[1..16].iter().collect();
        assert!(first_set.iter().all(|b| b.set_index == Some(0)));
        assert_eq!(first_set[14].kind, BlockKind::Work);
        assert_eq!(first_set[14].exercise.name, "Squat");
        assert_eq!(plan.blocks()[16].kind, BlockKind::BetweenSets);
        assert_eq!(plan.blocks()[16].seconds, 15);
    }

    #[test]
    fn tabata_alternates_pair_members() {
        let plan = build_tabata_plan(0, &tabata_selection()).unwrap();
        let names: Vec<&str> = plan
            .blocks()
            .iter()
            .take(8)
            .filter(|b| b.kind.is_work())
            .map(|b| b.exercise.name.as_str())
            .collect();
        assert_eq!(names, vec!["Push-up", "Squat", "Push-up", "Squat"]);
    }

    #[test]
    fn tabata_requires_three_pairs() {
        let mut selection = tabata_selection();
        selection.pairs.pop();
        assert!(build_tabata_plan(0, &selection).is_err());
    }

    #[test]
    fn timing_edits_keep_slot_invariant() {
        let t = TimingSpec::with_work(60, 30);
        assert_eq!(t.edit(TimingField::Work, 45), TimingSpec { slot: 60, work: 45, rest: 15 });
        assert_eq!(t.edit(TimingField::Rest, 100), TimingSpec { slot: 60, work: 1, rest: 59 });
        assert_eq!(t.edit(TimingField::Slot, 20), TimingSpec { slot: 20, work: 1, rest: 19 });
        assert_eq!(t.edit(TimingField::Slot, 0).slot, MIN_SLOT_SECONDS);
        assert!(t.edit(TimingField::Work, 0).is_valid());
    }

    #[test]
    fn suggested_slot_splits_target_time() {
        assert_eq!(suggested_slot_seconds(12.0, 4, 3), 60);
        assert_eq!(suggested_slot_seconds(0.0, 4, 3), 2);
        assert_eq!(suggested_slot_seconds(1.0, 0, 0), 60);
    }

    #[test]
    fn ensure_set_timings_keeps_overrides() {
        let previous = vec![TimingSpec { slot: 60, work: 80, rest: 0 }];
        let timings = ensure_set_timings(&previous, 3, 45, 25);
        assert_eq!(timings.len(), 3);
        assert_eq!(timings[0], TimingSpec { slot: 60, work: 60, rest: 0 });
        assert_eq!(timings[1], TimingSpec { slot: 45, work: 20, rest: 25 });
        assert!(timings.iter().all(TimingSpec::is_valid));
    }

    #[test]
    fn summary_matches_preview() {
        let timings = vec![TimingSpec::with_work(60, 30); 3];
        let summary = summarize(12.0, 4, 15, &timings);
        assert_eq!(summary.target_seconds, 720);
        assert_eq!(summary.planned_work_seconds, 360);
        assert_eq!(summary.session_seconds, 735);
    }

    #[test]
    fn work_list_labels_sets_and_slots() {
        let exercises = vec![ex("Squat", "legs"), ex("Row", "upper")];
        let timings = vec![TimingSpec::with_work(60, 30); 2];
        let plan = build_circuit_plan(2, 2, 15, &exercises, &timings).unwrap();
        let list = plan.work_list();
        assert_eq!(list.len(), 4);
        assert_eq!(list[0].plan_index, 1);
        assert_eq!(list[0].label, "Set 1/2. Ex 1/2. Squat (legs)");
        assert_eq!(list[3].label, "Set 2/2. Ex 2/2. Row (upper)");
    }

    #[test]
    fn next_work_exercise_skips_rest() {
        let exercises = vec![ex("Squat", "legs"), ex("Row", "upper")];
        let timings = vec![TimingSpec::with_work(60, 30)];
        let plan = build_circuit_plan(2, 1, 15, &exercises, &timings).unwrap();
        assert_eq!(plan.next_work_exercise(0).unwrap().name, "Squat");
        assert_eq!(plan.next_work_exercise(2).unwrap().name, "Row");
        assert!(plan.next_work_exercise(4).is_none());
    }

    #[test]
    fn plan_new_rejects_zero_second_blocks() {
        let blocks = vec![Block::new(BlockKind::Work, 0, ex("Squat", "legs"))];
        assert!(Plan::new(blocks).is_err());
    }
}
