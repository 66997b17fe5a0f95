//! Process-wide application state: one pattern, one playback controller.
//!
//! The UI adapter receives an [`ApplicationState`] at startup and routes every
//! user action through it.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::BeatBoxConfig;
use crate::error::Result;
use crate::pattern::Pattern;
use crate::playback::{PlaybackController, PlaybackState};
use crate::sequencer::SoundEventPlayer;
use crate::store;

pub struct ApplicationState<P: SoundEventPlayer> {
    pattern: Pattern,
    playback: PlaybackController<P>,
    tempo_up: f64,
    tempo_down: f64,
}

impl<P: SoundEventPlayer> ApplicationState<P> {
    pub fn new(player: P, config: &BeatBoxConfig) -> Self {
        let mut pattern = Pattern::new();
        pattern.set_bpm(config.base_bpm);
        Self {
            pattern,
            playback: PlaybackController::with_base_bpm(player, config.base_bpm),
            tempo_up: config.tempo_up,
            tempo_down: config.tempo_down,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn effective_bpm(&self) -> f64 {
        self.playback.effective_bpm()
    }

    pub fn toggle(&mut self, instrument: usize, step: usize) -> Result<()> {
        self.pattern.toggle(instrument, step)
    }

    /// Compile the current pattern and loop it. Restarts if already playing.
    pub fn start(&mut self) -> Result<()> {
        self.playback.start(&self.pattern)?;
        self.pattern.reset_tempo_factor();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn tempo_up(&mut self) {
        self.scale_tempo(self.tempo_up);
    }

    pub fn tempo_down(&mut self) {
        self.scale_tempo(self.tempo_down);
    }

    fn scale_tempo(&mut self, multiplier: f64) {
        self.pattern.scale_tempo_factor(multiplier);
        self.playback.adjust_tempo(multiplier);
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
    }

    pub fn save_pattern<Q: AsRef<Path>>(&self, path: Q) -> Result<()> {
        store::save(&self.pattern, path)
    }

    /// Load a pattern file, then stop and restart playback with it.
    ///
    /// If the file cannot be read or is malformed, the pattern and the
    /// transport are left exactly as they were.
    pub fn load_pattern<Q: AsRef<Path>>(&mut self, path: Q) -> Result<()> {
        let serialized = store::load(path)?;
        self.playback.stop();
        self.pattern.load_serialized(&serialized);
        info!(active = self.pattern.active_cells(), "applied loaded pattern");
        self.start()
    }
}

/// A timestamped pattern file name in `dir`, for saves with no chosen path.
pub fn default_pattern_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("pattern-{}.yaml", stamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::TimedEvent;
    use crate::error::Error;
    use crate::playback::tests::FakePlayer;
    use tempfile::tempdir;

    fn app() -> ApplicationState<FakePlayer> {
        ApplicationState::new(FakePlayer::new(), &BeatBoxConfig::default())
    }

    #[test]
    fn test_toggle_then_start_plays_cell() {
        let mut app = app();
        app.toggle(0, 0).unwrap();
        app.start().unwrap();

        assert_eq!(app.playback_state(), PlaybackState::Playing);
        let timeline = app.playback.player().timeline.as_ref().unwrap();
        assert!(timeline.events.contains(&TimedEvent::NoteOn {
            key: 35,
            velocity: 100,
            tick: 0
        }));
    }

    #[test]
    fn test_toggle_out_of_range() {
        let mut app = app();
        assert!(matches!(app.toggle(16, 16), Err(Error::Index { .. })));
    }

    #[test]
    fn test_tempo_buttons_keep_pattern_and_player_in_sync() {
        let mut app = app();
        app.tempo_up();
        app.tempo_up();
        app.tempo_down();

        let expected = 1.03 * 1.03 * 0.97;
        assert!((app.pattern().tempo_factor() - expected).abs() < 1e-12);
        assert!((app.playback.tempo_factor() - expected).abs() < 1e-12);
        assert!((app.effective_bpm() - 120.0 * expected).abs() < 1e-9);

        app.start().unwrap();
        assert_eq!(app.pattern().tempo_factor(), 1.0);
        assert_eq!(app.effective_bpm(), 120.0);
    }

    #[test]
    fn test_save_and_load_restarts_playback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("beat.yaml");

        let mut app = app();
        app.toggle(3, 4).unwrap();
        app.save_pattern(&path).unwrap();

        let mut other = self::app();
        other.load_pattern(&path).unwrap();
        assert!(other.pattern().cell(3, 4).unwrap());
        assert_eq!(other.pattern().active_cells(), 1);
        assert_eq!(other.playback_state(), PlaybackState::Playing);
        assert_eq!(other.playback.player().starts, 1);
    }

    #[test]
    fn test_bad_load_leaves_everything_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, serde_yaml::to_string(&vec![true; 257]).unwrap()).unwrap();

        let mut app = app();
        app.toggle(1, 1).unwrap();
        app.start().unwrap();
        let before = app.pattern().clone();

        assert!(matches!(app.load_pattern(&path), Err(Error::Format(_))));
        assert_eq!(app.pattern(), &before);
        assert_eq!(app.playback_state(), PlaybackState::Playing);
        assert_eq!(app.playback.player().starts, 1);

        assert!(matches!(
            app.load_pattern(dir.path().join("missing.yaml")),
            Err(Error::Io { .. })
        ));
        assert_eq!(app.pattern(), &before);
    }

    #[test]
    fn test_clear() {
        let mut app = app();
        app.toggle(2, 2).unwrap();
        app.clear();
        assert_eq!(app.pattern().active_cells(), 0);
    }

    #[test]
    fn test_default_pattern_path() {
        let path = default_pattern_path(Path::new("/tmp"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("pattern-"));
        assert!(name.ends_with(".yaml"));
        assert_eq!(path.parent(), Some(Path::new("/tmp")));
    }
}
