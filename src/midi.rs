//! MIDI protocol constants and the output port wrapper.
//!
//! The drum sounds live on the General MIDI percussion channel, so every note
//! the sequencer emits goes out on channel 10 (9 zero-based).

use midir::{MidiOutput, MidiOutputConnection};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Note On status (high nibble)
pub const NOTE_ON: u8 = 0x90;

/// Note Off status (high nibble)
pub const NOTE_OFF: u8 = 0x80;

/// Control Change status (high nibble)
pub const CONTROL_CHANGE: u8 = 0xB0;

/// Controller number for All Notes Off
pub const ALL_NOTES_OFF: u8 = 123;

/// General MIDI percussion channel (zero-based)
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Timeline resolution: pulses per quarter note. 4 means one tick per sixteenth.
pub const TICKS_PER_BEAT: u16 = 4;

/// Anything raw MIDI messages can be written to.
pub trait MidiSink: Send + 'static {
    fn send(&mut self, message: &[u8]) -> Result<()>;
}

/// Wrapper for MIDI output connection.
pub struct MidiOut {
    connection: MidiOutputConnection,
    pub port_name: String,
}

impl MidiOut {
    /// Open an output port.
    ///
    /// Picks the port whose name contains `preferred` when given, otherwise an
    /// IAC Driver port (macOS), otherwise the first port found.
    pub fn new(preferred: Option<&str>) -> Result<Self> {
        let midi_out = MidiOutput::new("beatbox-out")
            .map_err(|e| Error::Initialization(format!("Failed to create MIDI output: {}", e)))?;

        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(Error::Initialization(
                "No MIDI output ports found".to_string(),
            ));
        }

        let find = |needle: &str| {
            ports.iter().position(|p| {
                midi_out
                    .port_name(p)
                    .map(|n| n.contains(needle))
                    .unwrap_or(false)
            })
        };

        let port_idx = match preferred {
            Some(name) => find(name).unwrap_or_else(|| {
                warn!(device = name, "configured MIDI device not found, falling back");
                find("IAC").unwrap_or(0)
            }),
            None => find("IAC").unwrap_or(0),
        };

        let port = &ports[port_idx];
        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let connection = midi_out
            .connect(port, "beatbox-out")
            .map_err(|e| Error::Initialization(format!("Failed to connect MIDI output: {}", e)))?;

        info!(port = %port_name, "MIDI output connected");
        Ok(Self {
            connection,
            port_name,
        })
    }
}

impl MidiSink for MidiOut {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| Error::Send(e.to_string()))
    }
}

/// All Notes Off on the given channel.
pub fn all_notes_off(channel: u8) -> [u8; 3] {
    [CONTROL_CHANGE | (channel & 0x0F), ALL_NOTES_OFF, 0]
}
