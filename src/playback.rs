//! Playback control: compiles the pattern and drives the sound-event player.

use tracing::info;

use crate::compiler::Timeline;
use crate::error::Result;
use crate::pattern::{Pattern, DEFAULT_BPM};
use crate::sequencer::SoundEventPlayer;

/// Whether the loop is currently sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Owns the player and tracks the transport state.
///
/// The player is acquired before the controller is built, so a missing sound
/// backend surfaces as an initialization error from the player constructor
/// and there is never a controller without a usable player.
pub struct PlaybackController<P: SoundEventPlayer> {
    player: P,
    state: PlaybackState,
    base_bpm: f64,
}

impl<P: SoundEventPlayer> PlaybackController<P> {
    pub fn new(player: P) -> Self {
        Self::with_base_bpm(player, DEFAULT_BPM)
    }

    pub fn with_base_bpm(mut player: P, base_bpm: f64) -> Self {
        player.set_tempo_bpm(base_bpm);
        Self {
            player,
            state: PlaybackState::Stopped,
            base_bpm,
        }
    }

    /// Current transport state. A player that stopped on its own (for
    /// example after its output failed) reads as `Stopped`.
    pub fn state(&self) -> PlaybackState {
        match self.state {
            PlaybackState::Playing if !self.player.is_running() => PlaybackState::Stopped,
            state => state,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    /// Compile `pattern` and loop it from the top.
    ///
    /// Calling this while already playing replaces the running timeline.
    pub fn start(&mut self, pattern: &Pattern) -> Result<()> {
        let timeline = Timeline::from_pattern(pattern);
        let events = timeline.events.len();

        self.player.load(timeline);
        self.player.set_loop_continuously(true);
        self.restore_base_tempo();
        if let Err(e) = self.player.start() {
            self.player.stop();
            self.state = PlaybackState::Stopped;
            return Err(e);
        }
        self.state = PlaybackState::Playing;

        info!(events, bpm = self.base_bpm, "playback started");
        Ok(())
    }

    /// Stop the loop. Also reclaims a player whose thread already ended.
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Stopped {
            return;
        }
        self.player.stop();
        self.state = PlaybackState::Stopped;
        info!("playback stopped");
    }

    /// Scale the running tempo. Works whether or not the loop is playing.
    pub fn adjust_tempo(&mut self, multiplier: f64) {
        let factor = self.player.tempo_factor() * multiplier;
        self.player.set_tempo_factor(factor);
        info!(factor, bpm = self.effective_bpm(), "tempo adjusted");
    }

    /// Back to the base BPM at a scale factor of 1.0.
    pub fn restore_base_tempo(&mut self) {
        self.player.set_tempo_bpm(self.base_bpm);
        self.player.set_tempo_factor(1.0);
    }

    pub fn tempo_factor(&self) -> f64 {
        self.player.tempo_factor()
    }

    pub fn effective_bpm(&self) -> f64 {
        self.player.tempo_bpm() * self.player.tempo_factor()
    }
}
