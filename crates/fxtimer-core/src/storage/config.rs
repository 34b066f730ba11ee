//! TOML-based user preferences.
//!
//! Stores:
//! - The workout form (minutes, exercise and set counts, rest, group, preset)
//! - Sound switch and volume
//! - The two table URLs
//!
//! Configuration is stored at `~/.config/fxtimer/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::data_dir;
use crate::audio::SoundSettings;
use crate::error::ConfigError;
use crate::plan::TimingSpec;
use crate::preset::PresetKey;
use crate::runner::TICK_INTERVAL;
use crate::source::{DEFAULT_EXERCISES_URL, DEFAULT_SETTINGS_URL};
use crate::workout::{WorkoutRequest, ANY_GROUP};

/// Workout form values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutConfig {
    #[serde(default = "default_total_minutes")]
    pub total_minutes: f64,
    #[serde(default = "default_exercise_count")]
    pub exercise_count: usize,
    #[serde(default = "default_set_count")]
    pub set_count: usize,
    #[serde(default = "default_ready_seconds")]
    pub ready_seconds: u32,
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub preset: PresetKey,
    /// Per-set overrides, first set first.
    #[serde(default)]
    pub set_timings: Vec<TimingSpec>,
}

/// Table locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_settings_url")]
    pub settings_url: String,
    #[serde(default = "default_exercises_url")]
    pub exercises_url: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/fxtimer/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Fixed selection seed; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub workout: WorkoutConfig,
    #[serde(default)]
    pub sound: SoundSettings,
    #[serde(default)]
    pub source: SourceConfig,
}

// Default functions
fn default_total_minutes() -> f64 {
    12.0
}
fn default_exercise_count() -> usize {
    4
}
fn default_set_count() -> usize {
    3
}
fn default_ready_seconds() -> u32 {
    15
}
fn default_rest_seconds() -> u32 {
    25
}
fn default_group() -> String {
    ANY_GROUP.into()
}
fn default_settings_url() -> String {
    DEFAULT_SETTINGS_URL.into()
}
fn default_exercises_url() -> String {
    DEFAULT_EXERCISES_URL.into()
}
fn default_tick_interval_ms() -> u64 {
    TICK_INTERVAL.as_millis() as u64
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            total_minutes: default_total_minutes(),
            exercise_count: default_exercise_count(),
            set_count: default_set_count(),
            ready_seconds: default_ready_seconds(),
            default_rest_seconds: default_rest_seconds(),
            group: default_group(),
            preset: PresetKey::Custom,
            set_timings: Vec::new(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            settings_url: default_settings_url(),
            exercises_url: default_exercises_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            seed: None,
            workout: WorkoutConfig::default(),
            sound: SoundSettings::default(),
            source: SourceConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional values accept any JSON literal; bare text is a string.
                    serde_json::Value::Null => serde_json::from_str(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                debug!(path = %path.display(), "config loaded");
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field; `self` is unchanged in that case.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Every leaf key with its value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Reject values the rest of the program cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, raw) in [
            ("source.settings_url", &self.source.settings_url),
            ("source.exercises_url", &self.source.exercises_url),
        ] {
            url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                key: key.into(),
                message: e.to_string(),
            })?;
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tick_interval_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.sound.volume) {
            return Err(ConfigError::InvalidValue {
                key: "sound.volume".into(),
                message: "must be between 0.0 and 1.0".into(),
            });
        }
        Ok(())
    }

    /// Snapshot of the workout form for one build.
    pub fn workout_request(&self) -> WorkoutRequest {
        let w = &self.workout;
        WorkoutRequest {
            total_minutes: w.total_minutes,
            exercise_count: w.exercise_count,
            set_count: w.set_count,
            ready_seconds: w.ready_seconds,
            default_rest_seconds: w.default_rest_seconds,
            group: w.group.clone(),
            set_timings: w.set_timings.clone(),
            preset: w.preset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.workout.total_minutes, 12.0);
        assert_eq!(cfg.workout.exercise_count, 4);
        assert_eq!(cfg.workout.set_count, 3);
        assert_eq!(cfg.workout.ready_seconds, 15);
        assert_eq!(cfg.workout.default_rest_seconds, 25);
        assert_eq!(cfg.workout.group, "any");
        assert_eq!(cfg.workout.preset, PresetKey::Custom);
        assert!(cfg.sound.enabled);
        assert_eq!(cfg.tick_interval_ms, 100);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [workout]
            preset = "keops"
            [sound]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.workout.preset, PresetKey::Keops);
        assert_eq!(cfg.workout.exercise_count, 4);
        assert!(!cfg.sound.enabled);
        assert_eq!(cfg.sound.volume, 1.0);
        assert_eq!(cfg.source.settings_url, DEFAULT_SETTINGS_URL);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("sound.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("workout.exercise_count").as_deref(), Some("4"));
        assert_eq!(cfg.get("workout.preset").as_deref(), Some("custom"));
        assert!(cfg.get("workout.missing_key").is_none());
    }

    #[test]
    fn set_value_updates_nested_fields() {
        let mut cfg = Config::default();
        cfg.set_value("workout.exercise_count", "6").unwrap();
        cfg.set_value("workout.total_minutes", "20").unwrap();
        cfg.set_value("workout.preset", "30x30x6").unwrap();
        cfg.set_value("sound.enabled", "false").unwrap();
        cfg.set_value("seed", "42").unwrap();
        assert_eq!(cfg.workout.exercise_count, 6);
        assert_eq!(cfg.workout.total_minutes, 20.0);
        assert_eq!(cfg.workout.preset, PresetKey::ThirtyByThirtySix);
        assert!(!cfg.sound.enabled);
        assert_eq!(cfg.seed, Some(42));
    }

    #[test]
    fn set_value_accepts_set_timings_json() {
        let mut cfg = Config::default();
        cfg.set_value(
            "workout.set_timings",
            r#"[{"slot":60,"work":40,"rest":20}]"#,
        )
        .unwrap();
        assert_eq!(
            cfg.workout.set_timings,
            vec![TimingSpec {
                slot: 60,
                work: 40,
                rest: 20
            }]
        );
    }

    #[test]
    fn set_value_rejects_bad_input_and_keeps_state() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("workout.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set_value("sound.enabled", "not_a_bool").is_err());
        assert!(cfg.set_value("workout.exercise_count", "4.5").is_err());
        assert!(cfg.set_value("workout.preset", "hiit").is_err());
        assert!(cfg.set_value("source.exercises_url", "not a url").is_err());
        assert!(cfg.set_value("tick_interval_ms", "0").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.set_value("workout.group", "legs").unwrap();
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.workout.group, "legs");
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "workout = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn entries_flatten_every_leaf() {
        let entries = Config::default().entries();
        assert!(entries.contains(&("workout.exercise_count".into(), "4".into())));
        assert!(entries.contains(&("sound.volume".into(), "1.0".into())));
        assert!(entries.contains(&("seed".into(), "null".into())));
    }

    #[test]
    fn workout_request_mirrors_form() {
        let mut cfg = Config::default();
        cfg.workout.group = "core".into();
        cfg.workout.preset = PresetKey::Area51;
        let request = cfg.workout_request();
        assert_eq!(request.group, "core");
        assert_eq!(request.preset, PresetKey::Area51);
        assert_eq!(request.ready_seconds, 15);
    }
}
