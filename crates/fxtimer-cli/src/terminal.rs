//! Terminal output devices: a bell for cues and a one-line status renderer.

use std::io::Write;

use fxtimer_core::error::PlaybackError;
use fxtimer_core::{AudioStatus, CueKind, CuePlayer, DisplayView, RenderSink};

/// Rings the terminal bell on stderr. The end cue rings three times.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play_cue(&mut self, cue: CueKind, volume: f32) -> Result<(), PlaybackError> {
        if volume <= 0.0 {
            return Ok(());
        }
        let rings = match cue {
            CueKind::Work | CueKind::Rest => "\x07",
            CueKind::End => "\x07\x07\x07",
        };
        let mut stderr = std::io::stderr();
        stderr
            .write_all(rings.as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|e| PlaybackError::Failed(e.to_string()))
    }
}

/// Redraws one status line in place; a new line starts when the block changes.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    last_heading: Option<String>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn status_line(view: &DisplayView, audio: &AudioStatus) -> String {
    let mut line = format!("{:<9} {}", view.phase, view.timer_text);
    if !view.exercise_name.is_empty() {
        line.push_str(&format!("  {}", view.exercise_name));
        if !view.exercise_group.is_empty() {
            line.push_str(&format!(" ({})", view.exercise_group));
        }
    }
    if !view.next_name.is_empty() {
        line.push_str(&format!("  next: {}", view.next_name));
    }
    line.push_str(&format!(
        "  [{:>3}%] {}",
        view.progress.percent,
        view.remaining_label()
    ));
    let sound = audio.label();
    if !sound.is_empty() {
        line.push_str(&format!("  {sound}"));
    }
    line
}

impl RenderSink for TerminalRenderer {
    fn render(&mut self, view: &DisplayView, audio: &AudioStatus) {
        let heading = format!("{} {} {}", view.phase, view.set_line, view.exercise_name);
        let mut out = std::io::stdout().lock();

        if self.last_heading.as_deref() != Some(heading.as_str()) {
            if self.last_heading.is_some() {
                let _ = writeln!(out);
            }
            if !view.set_line.is_empty() {
                let _ = writeln!(out, "{}", view.set_line);
            }
            if !view.subtitle.is_empty() {
                let _ = writeln!(out, "  {}", view.subtitle);
            }
            self.last_heading = Some(heading);
        }

        let _ = write!(out, "\r\x1b[2K{}", status_line(view, audio));
        let _ = out.flush();
    }

    fn notice(&mut self, message: &str) {
        if self.last_heading.take().is_some() {
            println!();
        }
        println!("{message}");
    }
}
