pub mod config;
pub mod exercises;
pub mod plan;
pub mod presets;
pub mod run;
