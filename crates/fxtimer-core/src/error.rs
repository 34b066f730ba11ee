//! Core error types for fxtimer-core.
//!
//! Every failure here is recoverable: a rejected build or a failed load
//! leaves the previously installed plan and engine state untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fxtimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The requested workout cannot be built from the current pool/config.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// Exercise or settings data could not be fetched or parsed.
    #[error("{0}")]
    DataUnavailable(#[from] DataError),

    /// Audio cue playback failed.
    #[error("{0}")]
    Playback(#[from] PlaybackError),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a workout build is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("No enabled exercises found in CSV.")]
    NoExercises,

    #[error("Not enough unique exercises for N={requested}. Available: {available}.")]
    NotEnoughExercises { requested: usize, available: usize },

    #[error("Could not pick {requested} unique exercises. Picked: {picked}.")]
    SelectionShort { requested: usize, picked: usize },

    #[error("Could not build Tabata pairs with different groups. Try again or add more exercises.")]
    TabataPairingFailed,

    #[error("{preset} excludes group: {group}. Pick another group or use Any.")]
    GroupExcludedByPreset { preset: String, group: String },

    #[error("{preset} needs the balanced group mode; group filter '{group}' is not supported.")]
    GroupFilterUnsupported { preset: String, group: String },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Data source failures.
#[derive(Error, Debug)]
pub enum DataError {
    /// HTTP request failed or returned a non-success status
    #[error("{label} HTTP {status}")]
    HttpStatus { label: String, status: u16 },

    /// Transport-level failure
    #[error("{label} request failed: {source}")]
    Request {
        label: String,
        #[source]
        source: reqwest::Error,
    },

    /// Body does not look like delimited text
    #[error("{label} does not look like CSV")]
    NotCsv { label: String },

    /// Reading a local CSV file failed
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source URL is not valid
    #[error("Invalid source URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Cue playback failures. Never interrupt the timer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Audio output not supported: {0}")]
    Unsupported(String),

    #[error("Sound failed: {0}")]
    Failed(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Home/config directory could not be prepared
    #[error("Failed to prepare config directory {path}: {source}")]
    DirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_messages_match_status_text() {
        let err = ConfigurationError::NotEnoughExercises {
            requested: 4,
            available: 3,
        };
        assert_eq!(err.to_string(), "Not enough unique exercises for N=4. Available: 3.");

        let err = ConfigurationError::GroupExcludedByPreset {
            preset: "Area 51".into(),
            group: "full".into(),
        };
        assert_eq!(
            err.to_string(),
            "Area 51 excludes group: full. Pick another group or use Any."
        );
    }

    #[test]
    fn core_error_is_transparent_for_build_failures() {
        let err: CoreError = ConfigurationError::TabataPairingFailed.into();
        assert!(err.to_string().starts_with("Could not build Tabata pairs"));
    }

    #[test]
    fn data_error_names_the_table() {
        let err = DataError::HttpStatus {
            label: "Exercises".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "Exercises HTTP 404");
    }
}
