//! # fxtimer Core Library
//!
//! Core logic for the fxtimer interval-workout timer. Everything is usable
//! from the standalone `fxtimer` CLI, which is a thin terminal layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Selection**: draws unique exercises balanced across muscle groups, from
//!   a single group, or as mixed-group pairs for Tabata
//! - **Plan Builder**: expands a selection and per-set timings into an ordered
//!   sequence of ready / work / rest / between-sets blocks
//! - **Timer Engine**: a wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()`
//! - **Session + Runner**: one owner for pool, plan, engine and outputs, driven
//!   by a single tokio sampling loop
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`WorkoutEngine`]: Core timer state machine
//! - [`Session`]: Build pipeline and action dispatch
//! - [`Config`]: Application configuration management
//! - [`ExerciseSource`]: Trait for exercise data (CSV text, files, HTTP)

pub mod audio;
pub mod display;
pub mod error;
pub mod events;
pub mod exercise;
pub mod plan;
pub mod preset;
pub mod progress;
pub mod runner;
pub mod select;
pub mod session;
pub mod source;
pub mod storage;
pub mod timer;
pub mod workout;

pub use audio::{AudioStatus, CueKind, CuePlayer, SoundSettings};
pub use display::{DisplayView, RingKind};
pub use error::{ConfigError, ConfigurationError, CoreError, DataError, PlaybackError};
pub use events::Event;
pub use exercise::{ExercisePool, ExerciseRecord};
pub use plan::{Block, BlockKind, Plan, TimingSpec};
pub use preset::{Preset, PresetKey};
pub use progress::Progress;
pub use runner::{Command, RunnerHandle, RunnerOptions};
pub use session::{RenderSink, Session};
pub use source::{CsvSource, ExerciseSource, RemoteSource};
pub use storage::Config;
pub use timer::{Clock, ManualClock, SystemClock, TimerState, WorkoutEngine};
pub use workout::{build_workout, BuiltWorkout, WorkoutRequest};
