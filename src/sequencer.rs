//! Looping sound-event player.
//!
//! [`SoundEventPlayer`] is the seam the playback controller drives.
//! [`MidiSequencer`] implements it on top of any [`MidiSink`]: each `start`
//! spawns a playback thread that walks the timeline tick by tick and writes
//! raw MIDI to the sink.
//!
//! # Thread Safety
//! The caller thread and the playback thread share only atomics: a running
//! flag and the tempo (BPM and scale factor stored as `f64` bits). The sink is
//! moved into the thread on start and handed back when the thread is joined.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::compiler::Timeline;
use crate::error::{Error, Result};
use crate::midi::{all_notes_off, MidiOut, MidiSink, PERCUSSION_CHANNEL};
use crate::pattern::DEFAULT_BPM;

/// Longest a single tick may last, however far the tempo is scaled down.
const MAX_TICK_SECS: f64 = 3600.0;

/// What the playback controller needs from a sound backend.
pub trait SoundEventPlayer {
    /// Replace the current timeline. Takes effect on the next `start`.
    fn load(&mut self, timeline: Timeline);
    fn set_loop_continuously(&mut self, enabled: bool);
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn tempo_bpm(&self) -> f64;
    fn set_tempo_bpm(&mut self, bpm: f64);
    fn tempo_factor(&self) -> f64;
    fn set_tempo_factor(&mut self, factor: f64);
}

/// State shared with the playback thread.
struct Shared {
    running: AtomicBool,
    bpm_bits: AtomicU64,
    factor_bits: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            bpm_bits: AtomicU64::new(DEFAULT_BPM.to_bits()),
            factor_bits: AtomicU64::new(1.0f64.to_bits()),
        }
    }

    fn bpm(&self) -> f64 {
        f64::from_bits(self.bpm_bits.load(Ordering::SeqCst))
    }

    fn factor(&self) -> f64 {
        f64::from_bits(self.factor_bits.load(Ordering::SeqCst))
    }

    /// Wall-clock length of one tick at the current tempo.
    fn tick_duration(&self, ppq: u16) -> Duration {
        let ticks_per_minute = self.bpm() * self.factor() * f64::from(ppq);
        let secs = 60.0 / ticks_per_minute;
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs.min(MAX_TICK_SECS))
        } else {
            Duration::from_secs_f64(MAX_TICK_SECS)
        }
    }
}

/// Plays a [`Timeline`] on a MIDI sink from a background thread.
pub struct MidiSequencer<S: MidiSink> {
    sink: Option<S>,
    timeline: Arc<Timeline>,
    looping: bool,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<S>>,
}

impl<S: MidiSink> MidiSequencer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink: Some(sink),
            timeline: Arc::new(Timeline::from_events(Vec::new())),
            looping: false,
            shared: Arc::new(Shared::new()),
            handle: None,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Stop the playback thread, if any, and take the sink back.
    fn join(&mut self) -> Result<()> {
        self.shared.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        handle.thread().unpark();
        let mut sink = handle
            .join()
            .map_err(|_| Error::Send("playback thread panicked, MIDI output lost".to_string()))?;

        if let Err(e) = sink.send(&all_notes_off(PERCUSSION_CHANNEL)) {
            warn!(error = %e, "failed to silence output");
        }
        self.sink = Some(sink);
        Ok(())
    }
}

impl<S: MidiSink> SoundEventPlayer for MidiSequencer<S> {
    fn load(&mut self, timeline: Timeline) {
        self.timeline = Arc::new(timeline);
    }

    fn set_loop_continuously(&mut self, enabled: bool) {
        self.looping = enabled;
    }

    fn start(&mut self) -> Result<()> {
        self.join()?;
        let sink = self
            .sink
            .take()
            .ok_or_else(|| Error::Send("MIDI output lost".to_string()))?;

        self.shared.running.store(true, Ordering::SeqCst);
        let timeline = Arc::clone(&self.timeline);
        let shared = Arc::clone(&self.shared);
        let looping = self.looping;

        let handle = thread::Builder::new()
            .name("beatbox-playback".to_string())
            .spawn(move || play(sink, &timeline, &shared, looping))
            .map_err(|e| Error::Initialization(format!("Failed to spawn playback thread: {}", e)))?;
        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        if let Err(e) = self.join() {
            warn!(error = %e, "playback thread did not stop cleanly");
        }
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn tempo_bpm(&self) -> f64 {
        self.shared.bpm()
    }

    fn set_tempo_bpm(&mut self, bpm: f64) {
        self.shared.bpm_bits.store(bpm.to_bits(), Ordering::SeqCst);
        self.wake();
    }

    fn tempo_factor(&self) -> f64 {
        self.shared.factor()
    }

    fn set_tempo_factor(&mut self, factor: f64) {
        self.shared
            .factor_bits
            .store(factor.to_bits(), Ordering::SeqCst);
        self.wake();
    }
}

impl MidiSequencer<MidiOut> {
    /// Open a MIDI output port and wrap it in a sequencer.
    ///
    /// Fails with [`Error::Initialization`] when no port can be opened; there
    /// is no retry.
    pub fn connect(device: Option<&str>) -> Result<Self> {
        Ok(Self::new(MidiOut::new(device)?))
    }
}

impl<S: MidiSink> MidiSequencer<S> {
    /// Let a sleeping playback thread pick up a tempo change.
    fn wake(&self) {
        if let Some(handle) = &self.handle {
            handle.thread().unpark();
        }
    }
}

impl<S: MidiSink> Drop for MidiSequencer<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Playback thread body. Returns the sink so it can be reused.
fn play<S: MidiSink>(mut sink: S, timeline: &Timeline, shared: &Shared, looping: bool) -> S {
    debug!(
        events = timeline.events.len(),
        looping, "playback thread started"
    );
    let mut tick = 0u32;
    let mut tick_start = Instant::now();

    while shared.running.load(Ordering::SeqCst) {
        for event in timeline.events_at(tick) {
            if let Err(e) = sink.send(&event.to_midi_message()) {
                warn!(error = %e, "stopping playback");
                shared.running.store(false, Ordering::SeqCst);
                return sink;
            }
        }

        if tick >= timeline.length_ticks {
            if !looping {
                break;
            }
            // The wrap tick and tick 0 share the same instant.
            tick = 0;
            continue;
        }

        // Re-read the tempo on every wake so changes land mid-tick.
        loop {
            if !shared.running.load(Ordering::SeqCst) {
                return sink;
            }
            let deadline = tick_start + shared.tick_duration(timeline.ppq);
            let now = Instant::now();
            if now >= deadline {
                tick_start = deadline;
                break;
            }
            thread::park_timeout(deadline - now);
        }
        tick += 1;
    }

    shared.running.store(false, Ordering::SeqCst);
    debug!("playback thread finished");
    sink
}
