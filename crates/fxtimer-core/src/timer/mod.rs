mod clock;
mod engine;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineState, TimerState, WorkoutEngine, PRE_CUE_WINDOW_MS};
