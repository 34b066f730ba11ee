mod config;

pub use config::{Config, SourceConfig, WorkoutConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/fxtimer[-dev]/` based on FXTIMER_ENV.
///
/// Set FXTIMER_ENV=dev to use the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FXTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("fxtimer-dev")
    } else {
        base_dir.join("fxtimer")
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DirUnavailable {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
