//! Exercise and settings data.
//!
//! Both tables are plain delimited text. [`RemoteSource`] fetches them over
//! HTTP; [`CsvSource`] parses text already in hand (or local files).

pub mod csv;
pub mod remote;

pub use self::csv::{parse_csv, CsvRow, CsvSource};
pub use self::remote::{fetch_text, RemoteSource};

use crate::error::DataError;
use crate::exercise::{ExercisePool, ExerciseRecord};

pub const DEFAULT_SETTINGS_URL: &str =
    "https://wmprietopardo.github.io/fxsport/Documents/FXSport-Settings.csv";
pub const DEFAULT_EXERCISES_URL: &str =
    "https://wmprietopardo.github.io/fxsport/Documents/FXSport-Exercises.csv";

/// Where exercises and groups come from.
pub trait ExerciseSource {
    /// Enabled, named exercises in table order.
    fn list_enabled_exercises(&self) -> Result<Vec<ExerciseRecord>, DataError>;

    /// Group names offered for the group filter, sorted.
    fn list_groups(&self) -> Result<Vec<String>, DataError>;

    fn load_pool(&self) -> Result<ExercisePool, DataError> {
        Ok(ExercisePool::new(self.list_enabled_exercises()?))
    }
}
