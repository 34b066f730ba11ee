//! One workout session: pool, plan, engine and output devices.
//!
//! Every user action goes through [`Session`]. Engine events are dispatched
//! here: cue events reach the [`CuePlayer`] (gated by [`SoundSettings`]), and
//! any transition or tick produces one render of the current [`DisplayView`].

use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use tracing::{debug, info, warn};

use crate::audio::{AudioStatus, CueKind, CuePlayer, SoundSettings};
use crate::display::{view, DisplayView};
use crate::error::Result;
use crate::events::Event;
use crate::exercise::ExercisePool;
use crate::plan::Plan;
use crate::source::ExerciseSource;
use crate::timer::{Clock, SystemClock, TimerState, WorkoutEngine};
use crate::workout::{build_workout, BuiltWorkout, WorkoutRequest};

/// Where views and status lines go.
pub trait RenderSink: Send {
    fn render(&mut self, view: &DisplayView, audio: &AudioStatus);

    /// One-line status such as a build error or load summary.
    fn notice(&mut self, _message: &str) {}
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&mut self, _view: &DisplayView, _audio: &AudioStatus) {}
}

/// Sink that keeps every view and notice, shared across clones.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    views: Arc<Mutex<Vec<DisplayView>>>,
    notices: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn views(&self) -> Vec<DisplayView> {
        self.views.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<DisplayView> {
        self.views.lock().ok().and_then(|v| v.last().cloned())
    }
}

impl RenderSink for MemorySink {
    fn render(&mut self, view: &DisplayView, _audio: &AudioStatus) {
        if let Ok(mut views) = self.views.lock() {
            views.push(view.clone());
        }
    }

    fn notice(&mut self, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(message.to_string());
        }
    }
}

pub struct Session<C: Clock = SystemClock> {
    pool: ExercisePool,
    groups: Vec<String>,
    built: Option<BuiltWorkout>,
    engine: WorkoutEngine<C>,
    player: Box<dyn CuePlayer>,
    sink: Box<dyn RenderSink>,
    sound: SoundSettings,
    audio: AudioStatus,
    rng: Mcg128Xsl64,
}

impl Session<SystemClock> {
    pub fn new(player: Box<dyn CuePlayer>, sink: Box<dyn RenderSink>) -> Self {
        Self::with_clock(SystemClock, player, sink)
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(clock: C, player: Box<dyn CuePlayer>, sink: Box<dyn RenderSink>) -> Self {
        Self {
            pool: ExercisePool::default(),
            groups: Vec::new(),
            built: None,
            engine: WorkoutEngine::with_clock(Plan::default(), clock),
            player,
            sink,
            sound: SoundSettings::default(),
            audio: AudioStatus::default(),
            rng: Mcg128Xsl64::from_entropy(),
        }
    }

    /// Reproducible selections from here on.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mcg128Xsl64::seed_from_u64(seed);
        self
    }

    pub fn with_sound(mut self, sound: SoundSettings) -> Self {
        self.sound = sound;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn pool(&self) -> &ExercisePool {
        &self.pool
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn built(&self) -> Option<&BuiltWorkout> {
        self.built.as_ref()
    }

    pub fn plan(&self) -> &Plan {
        self.engine.plan()
    }

    pub fn engine(&self) -> &WorkoutEngine<C> {
        &self.engine
    }

    pub fn status(&self) -> TimerState {
        self.engine.status()
    }

    pub fn is_running(&self) -> bool {
        self.engine.status() == TimerState::Running
    }

    pub fn audio_status(&self) -> &AudioStatus {
        &self.audio
    }

    pub fn sound(&self) -> SoundSettings {
        self.sound
    }

    pub fn view(&self) -> DisplayView {
        view(self.engine.plan(), self.engine.state(), self.engine.now_ms())
    }

    // ── Setup ────────────────────────────────────────────────────────

    /// Replace the pool and group list. On failure the previous pool stays.
    pub fn load(&mut self, source: &dyn ExerciseSource) -> Result<usize> {
        let loaded = source
            .load_pool()
            .and_then(|pool| source.list_groups().map(|groups| (pool, groups)));
        let (pool, groups) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "exercise load failed");
                self.sink.notice(&format!("Load failed: {e}"));
                return Err(e.into());
            }
        };
        let count = pool.len();
        self.pool = pool;
        self.groups = groups;
        info!(exercises = count, groups = self.groups.len(), "exercise pool loaded");
        self.sink.notice(&format!("Loaded {count} enabled exercises."));
        Ok(count)
    }

    pub fn set_pool(&mut self, pool: ExercisePool) {
        self.groups = pool.groups();
        self.pool = pool;
    }

    pub fn set_sound(&mut self, sound: SoundSettings) {
        self.sound = sound;
    }

    /// Build and install a workout. The engine stops and waits on block 0.
    ///
    /// A rejected build leaves the current plan and engine state as they were.
    pub fn build(&mut self, request: &WorkoutRequest) -> Result<&BuiltWorkout> {
        let built = match build_workout(&self.pool, request, &mut self.rng) {
            Ok(built) => built,
            Err(e) => {
                warn!(error = %e, "workout build rejected");
                self.sink.notice(&e.to_string());
                return Err(e.into());
            }
        };

        self.engine.set_plan(built.plan.clone());
        self.render();
        Ok(self.built.insert(built))
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Start, resume, or run a finished workout again.
    pub fn start(&mut self) -> Vec<Event> {
        let events = self.engine.start();
        self.dispatch(events)
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let events = self.engine.pause();
        self.dispatch(events)
    }

    pub fn resume(&mut self) -> Vec<Event> {
        let events = self.engine.resume();
        self.dispatch(events)
    }

    pub fn skip(&mut self) -> Vec<Event> {
        let events = self.engine.skip();
        self.dispatch(events)
    }

    pub fn prev(&mut self) -> Vec<Event> {
        let events = self.engine.prev();
        self.dispatch(events)
    }

    pub fn restart(&mut self) -> Vec<Event> {
        let events = self.engine.restart();
        self.dispatch(events)
    }

    pub fn tick(&mut self) -> Vec<Event> {
        let events = self.engine.tick();
        self.dispatch(events)
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn dispatch(&mut self, events: Vec<Event>) -> Vec<Event> {
        if events.is_empty() {
            return events;
        }
        for cue in events.iter().filter_map(Event::cue) {
            self.play(cue);
        }
        self.render();
        events
    }

    fn play(&mut self, cue: CueKind) {
        if !self.sound.enabled {
            self.audio.suppressed += 1;
            return;
        }
        match self.player.play_cue(cue, self.sound.effective_volume()) {
            Ok(()) => {
                self.audio.played += 1;
                debug!(?cue, "cue played");
            }
            Err(e) => {
                self.audio.failures += 1;
                warn!(?cue, error = %e, "cue playback failed");
                self.audio.last_error = Some(e.to_string());
            }
        }
    }

    fn render(&mut self) {
        let view = self.view();
        self.sink.render(&view, &self.audio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryCuePlayer;
    use crate::error::{ConfigurationError, CoreError, DataError};
    use crate::exercise::ExerciseRecord;
    use crate::source::CsvSource;
    use crate::timer::ManualClock;
    use crate::workout::ANY_GROUP;

    const EXERCISES: &str = "group,name,enabled\n\
        upper,Push-up,true\n\
        upper,Dip,true\n\
        legs,Squat,true\n\
        legs,Lunge,true\n\
        core,Plank,true\n\
        core,Crunch,true\n";

    struct Fixture {
        session: Session<ManualClock>,
        clock: ManualClock,
        player: MemoryCuePlayer,
        sink: MemorySink,
    }

    fn fixture(player: MemoryCuePlayer) -> Fixture {
        let clock = ManualClock::new(0);
        let sink = MemorySink::new();
        let mut session = Session::with_clock(
            clock.clone(),
            Box::new(player.clone()),
            Box::new(sink.clone()),
        )
        .with_seed(42);
        session
            .load(&CsvSource::from_text("", EXERCISES))
            .unwrap();
        Fixture {
            session,
            clock,
            player,
            sink,
        }
    }

    fn small_request() -> WorkoutRequest {
        WorkoutRequest {
            exercise_count: 2,
            set_count: 1,
            ready_seconds: 5,
            set_timings: vec![crate::plan::TimingSpec::with_work(20, 10)],
            ..WorkoutRequest::default()
        }
    }

    #[test]
    fn load_reports_count_and_groups() {
        let f = fixture(MemoryCuePlayer::new());
        assert_eq!(f.session.pool().len(), 6);
        assert_eq!(f.session.groups(), ["core", "legs", "upper"]);
        assert_eq!(f.sink.notices(), vec!["Loaded 6 enabled exercises."]);
    }

    #[test]
    fn build_renders_idle_first_block() {
        let mut f = fixture(MemoryCuePlayer::new());
        f.session.build(&small_request()).unwrap();
        assert_eq!(f.session.status(), TimerState::Idle);
        let view = f.sink.last().unwrap();
        assert_eq!(view.phase, "Ready");
        assert_eq!(view.timer_text, "00:05");
    }

    #[test]
    fn failed_build_keeps_previous_plan() {
        let mut f = fixture(MemoryCuePlayer::new());
        f.session.build(&small_request()).unwrap();
        f.session.start();
        f.clock.advance(2_000);
        f.session.tick();
        let before = f.session.engine().state().clone();
        let plan_before = f.session.plan().clone();

        let request = WorkoutRequest {
            exercise_count: 10,
            group: ANY_GROUP.into(),
            ..WorkoutRequest::default()
        };
        let err = f.session.build(&request).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Configuration(ConfigurationError::NotEnoughExercises { .. })
        ));
        assert_eq!(f.session.engine().state(), &before);
        assert_eq!(f.session.plan(), &plan_before);
        assert!(f
            .sink
            .notices()
            .contains(&"Not enough unique exercises for N=10. Available: 6.".to_string()));
    }

    #[test]
    fn cues_reach_player() {
        let mut f = fixture(MemoryCuePlayer::new());
        f.session.build(&small_request()).unwrap();
        f.session.start();
        for _ in 0..50 {
            f.clock.advance(100);
            f.session.tick();
        }
        // ready entry, then the lead-in work cue
        assert_eq!(f.player.played(), vec![CueKind::Rest, CueKind::Work]);
        assert_eq!(f.session.audio_status().played, 2);
    }

    #[test]
    fn cue_failures_do_not_stop_timing() {
        let mut f = fixture(MemoryCuePlayer::failing());
        f.session.build(&small_request()).unwrap();
        f.session.start();
        for _ in 0..60 {
            f.clock.advance(100);
            f.session.tick();
        }
        assert_eq!(f.session.engine().plan_index(), 1);
        assert!(f.session.is_running());
        assert!(f.session.audio_status().failures >= 2);
        assert_eq!(f.session.audio_status().label(), "Sound failed");
    }

    #[test]
    fn disabled_sound_suppresses_cues() {
        let mut f = fixture(MemoryCuePlayer::new());
        f.session.set_sound(SoundSettings {
            enabled: false,
            volume: 1.0,
        });
        f.session.build(&small_request()).unwrap();
        f.session.start();
        assert!(f.player.played().is_empty());
        assert_eq!(f.session.audio_status().suppressed, 1);
    }

    #[test]
    fn same_seed_same_workout() {
        let records: Vec<ExerciseRecord> = (0..20)
            .map(|i| ExerciseRecord::new(format!("ex-{i}"), ["upper", "legs", "core"][i % 3]))
            .collect();
        let pick = |seed| {
            let mut session =
                Session::with_clock(ManualClock::new(0), Box::new(MemoryCuePlayer::new()), Box::new(NullSink))
                    .with_seed(seed);
            session.set_pool(ExercisePool::new(records.clone()));
            let exercises = session.build(&WorkoutRequest::default()).unwrap().exercises.clone();
            exercises
        };
        assert_eq!(pick(9), pick(9));
    }

    /// Exercises load but the group list does not.
    struct GroupsUnavailable;

    impl ExerciseSource for GroupsUnavailable {
        fn list_enabled_exercises(&self) -> std::result::Result<Vec<ExerciseRecord>, DataError> {
            Ok(vec![ExerciseRecord::new("Squat", "legs")])
        }

        fn list_groups(&self) -> std::result::Result<Vec<String>, DataError> {
            Err(DataError::HttpStatus {
                label: "Settings".into(),
                status: 503,
            })
        }
    }

    #[test]
    fn failed_group_list_keeps_pool_and_reports() {
        let Fixture {
            mut session, sink, ..
        } = fixture(MemoryCuePlayer::new());
        let before = session.pool().len();

        let err = session.load(&GroupsUnavailable).unwrap_err();
        assert!(matches!(err, CoreError::DataUnavailable(_)));
        assert_eq!(session.pool().len(), before);
        assert_eq!(
            sink.notices().last().map(String::as_str),
            Some("Load failed: Settings HTTP 503")
        );
    }
}
