//! Workout timer engine.
//!
//! The engine is a wall-clock-based state machine over a [`Plan`]. It does not
//! use internal threads - the caller is responsible for calling `tick()`
//! periodically (the runner does so every 100ms while the engine is running).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v
//!          Done -> (start/restart) -> Running
//! ```
//!
//! Skip, prev and restart stop the engine and leave it `Idle` on the
//! destination block at its full duration.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = WorkoutEngine::new(plan);
//! engine.start();
//! // In a loop:
//! engine.tick(); // Returns Tick, Cue and BlockEntered events
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use crate::audio::CueKind;
use crate::events::Event;
use crate::plan::{Block, BlockKind, Plan};
use crate::progress::{progress, Progress};

/// Lead-in window before a work block in which the work cue fires early.
pub const PRE_CUE_WINDOW_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Done,
}

/// Mutable timing state of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// Current block. Equals the plan length once the workout is done.
    pub plan_index: usize,
    /// Epoch ms when the current block (virtually) started.
    pub phase_start_ms: u64,
    pub phase_duration_ms: u64,
    pub phase_end_ms: u64,
    pub running: bool,
    pub paused: bool,
    pub paused_remaining_ms: u64,
    /// The early work cue already fired for this block.
    pub pre_cue_played: bool,
    pub done: bool,
}

impl EngineState {
    pub fn status(&self) -> TimerState {
        if self.done {
            TimerState::Done
        } else if self.running {
            TimerState::Running
        } else if self.paused {
            TimerState::Paused
        } else {
            TimerState::Idle
        }
    }

    /// Elapsed time in the current block. Idle blocks have not started;
    /// paused blocks keep the time they had.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        if self.running {
            now_ms
                .saturating_sub(self.phase_start_ms)
                .min(self.phase_duration_ms)
        } else if self.paused {
            self.phase_duration_ms
                .saturating_sub(self.paused_remaining_ms)
        } else {
            0
        }
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        if self.done {
            0
        } else if self.running {
            self.phase_end_ms.saturating_sub(now_ms)
        } else if self.paused {
            self.paused_remaining_ms
        } else {
            self.phase_duration_ms
        }
    }

    /// 0.0 .. 1.0 progress within the current block.
    pub fn fraction(&self, now_ms: u64) -> f64 {
        if self.phase_duration_ms == 0 {
            return 1.0;
        }
        self.elapsed_ms(now_ms) as f64 / self.phase_duration_ms as f64
    }
}

/// Core workout engine. Owns the plan and its timing state.
#[derive(Debug, Clone)]
pub struct WorkoutEngine<C: Clock = SystemClock> {
    plan: Plan,
    state: EngineState,
    clock: C,
}

impl WorkoutEngine<SystemClock> {
    pub fn new(plan: Plan) -> Self {
        Self::with_clock(plan, SystemClock)
    }
}

impl<C: Clock> WorkoutEngine<C> {
    /// Engine in the `Idle` state with the first block loaded.
    pub fn with_clock(plan: Plan, clock: C) -> Self {
        let mut engine = Self {
            plan,
            state: EngineState::default(),
            clock,
        };
        engine.load_block(0);
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn status(&self) -> TimerState {
        self.state.status()
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn plan_index(&self) -> usize {
        self.state.plan_index
    }

    pub fn current_block(&self) -> Option<&Block> {
        self.plan.get(self.state.plan_index)
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.state.remaining_ms(self.now_ms())
    }

    pub fn fraction(&self) -> f64 {
        self.state.fraction(self.now_ms())
    }

    pub fn progress(&self) -> Progress {
        progress(&self.plan, &self.state, self.now_ms())
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.status(),
            plan_index: self.state.plan_index,
            block_kind: self.current_block().map(|b| b.kind),
            remaining_ms: self.remaining_ms(),
            total_ms: self.state.phase_duration_ms,
            progress_pct: self.progress().percent,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// The "start" action: begin the loaded block, resume a paused one, or
    /// run a finished workout again from the top.
    pub fn start(&mut self) -> Vec<Event> {
        match self.status() {
            TimerState::Running => Vec::new(),
            TimerState::Paused => self.resume(),
            TimerState::Done => {
                self.load_block(0);
                self.begin_running()
            }
            TimerState::Idle => self.begin_running(),
        }
    }

    pub fn pause(&mut self) -> Vec<Event> {
        if self.status() != TimerState::Running {
            return Vec::new();
        }
        let now = self.now_ms();
        self.state.paused_remaining_ms = self.state.phase_end_ms.saturating_sub(now);
        self.state.running = false;
        self.state.paused = true;
        debug!(index = self.state.plan_index, remaining_ms = self.state.paused_remaining_ms, "paused");
        vec![Event::TimerPaused {
            plan_index: self.state.plan_index,
            remaining_ms: self.state.paused_remaining_ms,
            at: Utc::now(),
        }]
    }

    /// Continue the paused block from where it stopped.
    pub fn resume(&mut self) -> Vec<Event> {
        if self.status() != TimerState::Paused {
            return Vec::new();
        }
        let now = self.now_ms();
        let remaining = self.state.paused_remaining_ms;
        let elapsed = self.state.phase_duration_ms.saturating_sub(remaining);
        self.state.phase_start_ms = now.saturating_sub(elapsed);
        self.state.phase_end_ms = now + remaining;
        self.state.paused = false;
        self.state.running = true;
        debug!(index = self.state.plan_index, remaining_ms = remaining, "resumed");
        vec![Event::TimerResumed {
            plan_index: self.state.plan_index,
            remaining_ms: remaining,
            at: Utc::now(),
        }]
    }

    pub fn skip(&mut self) -> Vec<Event> {
        let target = self.state.plan_index.saturating_add(1);
        self.navigate(target)
    }

    pub fn prev(&mut self) -> Vec<Event> {
        let target = self.state.plan_index.saturating_sub(1);
        self.navigate(target)
    }

    pub fn restart(&mut self) -> Vec<Event> {
        self.navigate(0)
    }

    /// Install a freshly built plan; the engine returns to `Idle` on block 0.
    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = plan;
        self.load_block(0);
    }

    /// Call periodically while running.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.state.running {
            return Vec::new();
        }

        let now = self.now_ms();
        let index = self.state.plan_index;
        let remaining = self.state.phase_end_ms.saturating_sub(now);
        let mut events = vec![Event::Tick {
            plan_index: index,
            remaining_ms: remaining,
            fraction: self.state.fraction(now),
            at: Utc::now(),
        }];

        let current_is_work = self.current_block().is_some_and(|b| b.kind.is_work());
        let next_is_work = self.plan.get(index + 1).is_some_and(|b| b.kind.is_work());
        if !current_is_work
            && next_is_work
            && !self.state.pre_cue_played
            && remaining > 0
            && remaining <= PRE_CUE_WINDOW_MS
        {
            self.state.pre_cue_played = true;
            events.push(cue(CueKind::Work, index));
        }

        if remaining == 0 {
            events.extend(self.advance());
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Move past an expired block while running.
    fn advance(&mut self) -> Vec<Event> {
        let pre_cue_fired = self.state.pre_cue_played;
        let previous_end = self.state.phase_end_ms;
        let next = self.state.plan_index + 1;

        if next >= self.plan.len() {
            self.state = EngineState {
                plan_index: self.plan.len(),
                done: true,
                ..EngineState::default()
            };
            info!(total_seconds = self.plan.total_seconds(), "workout completed");
            return vec![
                cue(CueKind::End, next),
                Event::WorkoutCompleted {
                    total_seconds: self.plan.total_seconds(),
                    at: Utc::now(),
                },
            ];
        }

        self.load_block(next);
        // Anchor on the previous end so sampling jitter does not accumulate.
        self.state.phase_start_ms = previous_end;
        self.state.phase_end_ms = previous_end + self.state.phase_duration_ms;
        self.state.running = true;

        let mut events = vec![self.entered()];
        let kind = self.plan.get(next).map(|b| b.kind);
        match kind {
            Some(BlockKind::Work) if pre_cue_fired => {}
            Some(BlockKind::Work) => events.push(cue(CueKind::Work, next)),
            Some(_) => events.push(cue(CueKind::Rest, next)),
            None => {}
        }
        events
    }

    fn begin_running(&mut self) -> Vec<Event> {
        let Some(kind) = self.current_block().map(|b| b.kind) else {
            return Vec::new();
        };
        let now = self.now_ms();
        self.state.phase_start_ms = now;
        self.state.phase_end_ms = now + self.state.phase_duration_ms;
        self.state.pre_cue_played = false;
        self.state.running = true;
        self.state.paused = false;

        let entry = if kind.is_work() {
            CueKind::Work
        } else {
            CueKind::Rest
        };
        vec![self.entered(), cue(entry, self.state.plan_index)]
    }

    /// Stop everything and load `target` (clamped) at full duration.
    fn navigate(&mut self, target: usize) -> Vec<Event> {
        if self.plan.is_empty() {
            return Vec::new();
        }
        let from = self.state.plan_index;
        let to = target.min(self.plan.len() - 1);
        self.load_block(to);
        debug!(from, to, "navigated");
        vec![
            Event::Navigated {
                from,
                to,
                at: Utc::now(),
            },
            self.entered(),
        ]
    }

    /// Reset per-block state for `index`, stopped.
    fn load_block(&mut self, index: usize) {
        let duration = self.plan.get(index).map(Block::duration_ms).unwrap_or(0);
        let now = self.now_ms();
        self.state = EngineState {
            plan_index: index,
            phase_start_ms: now,
            phase_duration_ms: duration,
            phase_end_ms: now + duration,
            ..EngineState::default()
        };
    }

    fn entered(&self) -> Event {
        let block = self.current_block();
        Event::BlockEntered {
            plan_index: self.state.plan_index,
            kind: block.map(|b| b.kind).unwrap_or(BlockKind::Ready),
            seconds: block.map(|b| b.seconds).unwrap_or(0),
            at: Utc::now(),
        }
    }
}

fn cue(cue: CueKind, plan_index: usize) -> Event {
    Event::Cue {
        cue,
        plan_index,
        at: Utc::now(),
    }
}
