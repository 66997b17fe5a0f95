//! The fixed drum kit: one General MIDI percussion key per grid row.

/// Number of instrument rows in the grid.
pub const INSTRUMENT_COUNT: usize = 16;

/// A named percussion sound and the MIDI key that triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub name: &'static str,
    /// General MIDI percussion key number (played on channel 10)
    pub sound_code: u8,
}

const fn inst(name: &'static str, sound_code: u8) -> Instrument {
    Instrument { name, sound_code }
}

/// Row `i` of every pattern plays `INSTRUMENTS[i]`.
pub const INSTRUMENTS: [Instrument; INSTRUMENT_COUNT] = [
    inst("Bass Drum", 35),
    inst("Closed Hi-Hat", 42),
    inst("Open Hi-Hat", 46),
    inst("Acoustic Snare", 38),
    inst("Crash Cymbal", 49),
    inst("Hand Clap", 39),
    inst("High Tom", 50),
    inst("Hi Bongo", 60),
    inst("Maracas", 70),
    inst("Whistle", 72),
    inst("Low Conga", 64),
    inst("Cowbell", 56),
    inst("Vibraslap", 58),
    inst("Low-mid Tom", 47),
    inst("High Agogo", 67),
    inst("Open Hi Conga", 63),
];

/// Look up an instrument by row index.
pub fn instrument(index: usize) -> Option<&'static Instrument> {
    INSTRUMENTS.get(index)
}
