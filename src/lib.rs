//! BeatBox - a 16-step, 16-instrument drum machine.
//!
//! The grid ([`pattern::Pattern`]) is compiled into timed MIDI events
//! ([`compiler::compile`]) and looped by a sound-event player
//! ([`sequencer::MidiSequencer`]) under the control of
//! [`playback::PlaybackController`]. Patterns persist through [`store`].

pub mod app;
pub mod compiler;
pub mod config;
pub mod error;
pub mod export;
pub mod instrument;
pub mod midi;
pub mod pattern;
pub mod playback;
pub mod sequencer;
pub mod store;

pub use error::{Error, Result};

/// Initialise `tracing` output for a binary. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
