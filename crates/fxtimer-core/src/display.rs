//! What the view shows for the current engine position.
//!
//! Pure projection over the immutable plan; safe to call on every tick.

use serde::Serialize;

use crate::exercise::ExerciseRecord;
use crate::plan::{BlockKind, Plan};
use crate::progress::{format_clock, progress, Progress};
use crate::timer::EngineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RingKind {
    Work,
    Ready,
    Rest,
}

impl From<BlockKind> for RingKind {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Work => RingKind::Work,
            BlockKind::Ready => RingKind::Ready,
            BlockKind::Rest | BlockKind::BetweenSets => RingKind::Rest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Artwork {
    Image(String),
    /// Big exercise name shown when there is no image.
    Fallback(String),
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayView {
    pub phase: &'static str,
    pub set_line: String,
    pub exercise_name: String,
    pub exercise_group: String,
    pub subtitle: String,
    pub artwork: Artwork,
    pub ring: RingKind,
    pub ring_fraction: f64,
    pub timer_text: String,
    pub next_name: String,
    pub progress: Progress,
}

impl DisplayView {
    pub fn remaining_label(&self) -> String {
        self.progress.remaining_label()
    }
}

/// The exercise shown while `index` is current.
///
/// Work blocks show their own exercise. Every other block shows the next
/// upcoming work exercise, or nothing when none is left.
pub fn display_exercise(plan: &Plan, index: usize) -> Option<&ExerciseRecord> {
    let block = plan.get(index)?;
    if block.kind.is_work() {
        Some(&block.exercise)
    } else {
        plan.next_work_exercise(index + 1)
    }
}

fn next_name(plan: &Plan, from: usize) -> String {
    plan.next_work_exercise(from)
        .map(|e| e.name.clone())
        .unwrap_or_default()
}

pub fn view(plan: &Plan, state: &EngineState, now_ms: u64) -> DisplayView {
    let progress = progress(plan, state, now_ms);
    let index = state.plan_index;

    let Some(block) = plan.get(index).filter(|_| !state.done) else {
        return DisplayView {
            phase: "Done",
            set_line: String::new(),
            exercise_name: String::new(),
            exercise_group: String::new(),
            subtitle: String::new(),
            artwork: Artwork::None,
            ring: RingKind::Rest,
            ring_fraction: 1.0,
            timer_text: format_clock(0),
            next_name: String::new(),
            progress,
        };
    };

    let phase = match block.kind {
        BlockKind::Ready => "Ready",
        BlockKind::Work => "Exercise",
        BlockKind::Rest => "Rest",
        BlockKind::BetweenSets => "Set break",
    };

    let set_line = match (block.kind, block.set_index, block.slot_index) {
        (BlockKind::Work | BlockKind::Rest, Some(set), Some(slot)) => format!(
            "Set {}/{}. Exercise {}/{}",
            set + 1,
            block.total_sets,
            slot + 1,
            block.total_exercises
        ),
        _ => String::new(),
    };

    let shown = display_exercise(plan, index);
    let upcoming = next_name(plan, index + 1);
    let subtitle = match block.kind {
        BlockKind::Ready if upcoming.is_empty() => "Get ready.".to_string(),
        BlockKind::Ready => format!("Next: {upcoming}"),
        BlockKind::Rest | BlockKind::BetweenSets if upcoming.is_empty() => String::new(),
        BlockKind::Rest | BlockKind::BetweenSets => format!("Up next: {upcoming}"),
        BlockKind::Work => block.exercise.how_to.clone(),
    };

    let artwork = match shown {
        Some(e) if !e.image_url.is_empty() => Artwork::Image(e.image_url.clone()),
        Some(e) if !e.name.is_empty() => Artwork::Fallback(e.name.clone()),
        Some(_) => Artwork::Fallback("Exercise".to_string()),
        None => Artwork::None,
    };

    let next_from = match block.kind {
        BlockKind::Rest | BlockKind::BetweenSets => index + 2,
        BlockKind::Ready | BlockKind::Work => index + 1,
    };

    let remaining_secs = state.remaining_ms(now_ms).div_ceil(1000);

    DisplayView {
        phase,
        set_line,
        exercise_name: shown.map(|e| e.name.clone()).unwrap_or_default(),
        exercise_group: shown.map(|e| e.group.clone()).unwrap_or_default(),
        subtitle,
        artwork,
        ring: block.kind.into(),
        ring_fraction: state.fraction(now_ms).clamp(0.0, 1.0),
        timer_text: format_clock(remaining_secs),
        next_name: next_name(plan, next_from),
        progress,
    }
}
