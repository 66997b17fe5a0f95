//! Pattern to event-sequence compilation.
//!
//! [`compile`] walks the grid row by row and produces the timed note events a
//! sound-event player needs to render one loop. Tempo is deliberately absent:
//! ticks are sixteenth-note positions and the player scales them.

use tracing::debug;

use crate::instrument::INSTRUMENTS;
use crate::midi::{CONTROL_CHANGE, NOTE_OFF, NOTE_ON, PERCUSSION_CHANNEL, TICKS_PER_BEAT};
use crate::pattern::{Pattern, STEP_COUNT};

/// Velocity of every drum hit.
pub const VELOCITY: u8 = 100;

/// Channel of the per-row control marker.
pub const ROW_MARKER_CHANNEL: u8 = 1;

/// Value of the per-row control marker.
pub const ROW_MARKER_VALUE: u8 = 127;

/// Value of the final program marker on the percussion channel.
pub const PROGRAM_MARKER_VALUE: u8 = 1;

/// Tick of the final program marker.
pub const PROGRAM_MARKER_TICK: u32 = 15;

/// One event in a loop, positioned in sixteenth-note ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedEvent {
    NoteOn { key: u8, velocity: u8, tick: u32 },
    NoteOff { key: u8, velocity: u8, tick: u32 },
    ControlChange { channel: u8, value: u8, tick: u32 },
}

impl TimedEvent {
    pub fn tick(&self) -> u32 {
        match *self {
            TimedEvent::NoteOn { tick, .. }
            | TimedEvent::NoteOff { tick, .. }
            | TimedEvent::ControlChange { tick, .. } => tick,
        }
    }

    /// Raw MIDI bytes. Notes go out on the percussion channel; a control
    /// change carries its value in the controller byte with zero data.
    pub fn to_midi_message(&self) -> [u8; 3] {
        match *self {
            TimedEvent::NoteOn { key, velocity, .. } => {
                [NOTE_ON | PERCUSSION_CHANNEL, key & 0x7F, velocity & 0x7F]
            }
            TimedEvent::NoteOff { key, velocity, .. } => {
                [NOTE_OFF | PERCUSSION_CHANNEL, key & 0x7F, velocity & 0x7F]
            }
            TimedEvent::ControlChange { channel, value, .. } => {
                [CONTROL_CHANGE | (channel & 0x0F), value & 0x7F, 0]
            }
        }
    }
}

/// Compile a pattern into its event sequence.
///
/// Rows are emitted in instrument order; within a row each active step yields
/// a NoteOn at the step and a NoteOff one step later. Every row, empty or
/// not, ends with a control marker at tick 16, and the whole sequence ends
/// with a program marker at tick 15. The result is in emission order, not
/// tick order.
pub fn compile(pattern: &Pattern) -> Vec<TimedEvent> {
    let mut events = Vec::new();

    for (row, instrument) in pattern.rows().zip(INSTRUMENTS.iter()) {
        let key = instrument.sound_code;
        for (step, _) in row.iter().enumerate().filter(|(_, on)| **on) {
            let tick = step as u32;
            events.push(TimedEvent::NoteOn {
                key,
                velocity: VELOCITY,
                tick,
            });
            events.push(TimedEvent::NoteOff {
                key,
                velocity: VELOCITY,
                tick: tick + 1,
            });
        }
        events.push(TimedEvent::ControlChange {
            channel: ROW_MARKER_CHANNEL,
            value: ROW_MARKER_VALUE,
            tick: STEP_COUNT as u32,
        });
    }

    events.push(TimedEvent::ControlChange {
        channel: PERCUSSION_CHANNEL,
        value: PROGRAM_MARKER_VALUE,
        tick: PROGRAM_MARKER_TICK,
    });

    debug!(events = events.len(), "compiled pattern");
    events
}

/// A compiled loop ready for a player: events in tick order.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Ticks per quarter note
    pub ppq: u16,
    /// Length of one loop iteration in ticks
    pub length_ticks: u32,
    /// Events sorted by tick; ties keep compile order
    pub events: Vec<TimedEvent>,
}

impl Timeline {
    /// Build a timeline from compiled events. The sort is stable so events
    /// on the same tick keep their row order.
    pub fn from_events(mut events: Vec<TimedEvent>) -> Self {
        events.sort_by_key(|e| e.tick());
        Self {
            ppq: TICKS_PER_BEAT,
            length_ticks: STEP_COUNT as u32,
            events,
        }
    }

    pub fn from_pattern(pattern: &Pattern) -> Self {
        Self::from_events(compile(pattern))
    }

    /// Events sitting exactly on `tick`.
    pub fn events_at(&self, tick: u32) -> impl Iterator<Item = &TimedEvent> {
        let start = self.events.partition_point(|e| e.tick() < tick);
        self.events[start..]
            .iter()
            .take_while(move |e| e.tick() == tick)
    }
}
