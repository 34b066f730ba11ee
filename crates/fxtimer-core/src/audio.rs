//! Audio cue capability.
//!
//! Cues are fire-and-forget. A failed cue is recorded in [`AudioStatus`]
//! and logged; it never reaches the timing engine.

use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    /// Work is starting (also the 5s lead-in warning).
    Work,
    /// Rest, ready or set break is starting.
    Rest,
    /// Workout finished.
    End,
}

/// Something that can make a cue audible.
pub trait CuePlayer: Send {
    /// `volume` is 0.0..=1.0.
    fn play_cue(&mut self, cue: CueKind, volume: f32) -> Result<(), PlaybackError>;
}

/// User-facing sound switch and volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    1.0
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: default_volume(),
        }
    }
}

impl SoundSettings {
    /// Volume clamped to 0.0..=1.0; non-finite values count as full volume.
    pub fn effective_volume(&self) -> f32 {
        if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Status indicator for the sound subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioStatus {
    pub played: u32,
    pub suppressed: u32,
    pub failures: u32,
    pub last_error: Option<String>,
}

impl AudioStatus {
    pub fn label(&self) -> &'static str {
        match (self.failures, self.played) {
            (0, 0) => "",
            (0, _) => "Sound enabled",
            _ => "Sound failed",
        }
    }
}

/// Player that discards every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCuePlayer;

impl CuePlayer for SilentCuePlayer {
    fn play_cue(&mut self, _cue: CueKind, _volume: f32) -> Result<(), PlaybackError> {
        Ok(())
    }
}

/// Player that records cues in memory, optionally failing each one.
#[derive(Debug, Clone, Default)]
pub struct MemoryCuePlayer {
    played: std::sync::Arc<std::sync::Mutex<Vec<CueKind>>>,
    fail: bool,
}

impl MemoryCuePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `play_cue` returns an error (still recorded).
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Cues played so far, shared across clones.
    pub fn played(&self) -> Vec<CueKind> {
        self.played
            .lock()
            .map(|cues| cues.clone())
            .unwrap_or_default()
    }
}

impl CuePlayer for MemoryCuePlayer {
    fn play_cue(&mut self, cue: CueKind, _volume: f32) -> Result<(), PlaybackError> {
        if let Ok(mut cues) = self.played.lock() {
            cues.push(cue);
        }
        if self.fail {
            return Err(PlaybackError::Failed("audio not unlocked".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_clamped() {
        let s = SoundSettings {
            enabled: true,
            volume: 3.0,
        };
        assert_eq!(s.effective_volume(), 1.0);
        let s = SoundSettings {
            enabled: true,
            volume: f32::NAN,
        };
        assert_eq!(s.effective_volume(), 1.0);
        let s = SoundSettings {
            enabled: true,
            volume: -1.0,
        };
        assert_eq!(s.effective_volume(), 0.0);
    }

    #[test]
    fn memory_player_shares_log_between_clones() {
        let player = MemoryCuePlayer::new();
        let mut handle = player.clone();
        handle.play_cue(CueKind::Work, 1.0).unwrap();
        assert_eq!(player.played(), vec![CueKind::Work]);
    }

    #[test]
    fn failing_player_still_records() {
        let mut player = MemoryCuePlayer::failing();
        assert!(player.play_cue(CueKind::End, 1.0).is_err());
        assert_eq!(player.played(), vec![CueKind::End]);
    }

    #[test]
    fn status_label() {
        let mut status = AudioStatus::default();
        assert_eq!(status.label(), "");
        status.played = 2;
        assert_eq!(status.label(), "Sound enabled");
        status.failures = 1;
        assert_eq!(status.label(), "Sound failed");
    }
}
