use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::CueKind;
use crate::plan::BlockKind;
use crate::timer::TimerState;

/// Every engine transition produces events.
/// The session turns cue events into sound and everything else into renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A block became current (started, advanced into, or navigated to).
    BlockEntered {
        plan_index: usize,
        kind: BlockKind,
        seconds: u32,
        at: DateTime<Utc>,
    },
    /// Periodic sample of the running block.
    Tick {
        plan_index: usize,
        remaining_ms: u64,
        fraction: f64,
        at: DateTime<Utc>,
    },
    /// Request to play an audio cue. Best effort.
    Cue {
        cue: CueKind,
        plan_index: usize,
        at: DateTime<Utc>,
    },
    TimerPaused {
        plan_index: usize,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        plan_index: usize,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Manual skip, rewind or restart.
    Navigated {
        from: usize,
        to: usize,
        at: DateTime<Utc>,
    },
    WorkoutCompleted {
        total_seconds: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        plan_index: usize,
        block_kind: Option<BlockKind>,
        remaining_ms: u64,
        total_ms: u64,
        progress_pct: u8,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The cue carried by a `Cue` event.
    pub fn cue(&self) -> Option<CueKind> {
        match self {
            Event::Cue { cue, .. } => Some(*cue),
            _ => None,
        }
    }
}
