//! Whole-workout progress derived from the plan and the engine position.

use serde::Serialize;

use crate::plan::Plan;
use crate::timer::EngineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 0..=100
    pub percent: u8,
    pub remaining_seconds: u64,
}

impl Progress {
    /// `Remaining: mm:ss`
    pub fn remaining_label(&self) -> String {
        format!("Remaining: {}", format_clock(self.remaining_seconds))
    }
}

/// Percent complete and time left across the whole plan.
///
/// Finished blocks count in full. The current block counts its whole elapsed
/// seconds only while running; idle and paused blocks count nothing.
pub fn progress(plan: &Plan, state: &EngineState, now_ms: u64) -> Progress {
    let total = plan.total_seconds();
    if total == 0 {
        return Progress {
            percent: 0,
            remaining_seconds: 0,
        };
    }

    let elapsed = if state.running {
        state.elapsed_ms(now_ms) / 1000
    } else {
        0
    };
    let done = plan.cumulative_seconds(state.plan_index) + elapsed;
    let fraction = (done as f64 / total as f64).clamp(0.0, 1.0);

    Progress {
        percent: (fraction * 100.0).round() as u8,
        remaining_seconds: total.saturating_sub(done),
    }
}

/// `mm:ss`, minutes unbounded.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
