//! Standard MIDI File export of a compiled pattern.

use std::path::Path;

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use tracing::info;

use crate::compiler::{TimedEvent, Timeline};
use crate::error::{Error, Result};
use crate::midi::PERCUSSION_CHANNEL;
use crate::pattern::Pattern;

/// Largest value the 24-bit SMF tempo field can hold.
const MAX_TEMPO_US: f64 = 0xFF_FFFF as f64;

/// Microseconds per quarter note for `bpm`, if it fits the tempo meta event.
fn tempo_us_per_quarter(bpm: f64) -> Result<u32> {
    let us = (60_000_000.0 / bpm).round();
    if !bpm.is_finite() || !(1.0..=MAX_TEMPO_US).contains(&us) {
        return Err(Error::Format(format!(
            "tempo {} BPM cannot be stored in a MIDI file",
            bpm
        )));
    }
    Ok(us as u32)
}

fn track_event(delta: u32, event: &TimedEvent) -> TrackEvent<'static> {
    let (channel, message) = match *event {
        TimedEvent::NoteOn { key, velocity, .. } => (
            PERCUSSION_CHANNEL,
            MidiMessage::NoteOn {
                key: key.into(),
                vel: velocity.into(),
            },
        ),
        TimedEvent::NoteOff { key, velocity, .. } => (
            PERCUSSION_CHANNEL,
            MidiMessage::NoteOff {
                key: key.into(),
                vel: velocity.into(),
            },
        ),
        TimedEvent::ControlChange { channel, value, .. } => (
            channel,
            MidiMessage::Controller {
                controller: value.into(),
                value: 0.into(),
            },
        ),
    };

    TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Midi {
            channel: channel.into(),
            message,
        },
    }
}

/// Encode one loop of `pattern` as a single-track SMF at `bpm`.
pub fn to_smf_bytes(pattern: &Pattern, bpm: f64) -> Result<Vec<u8>> {
    let tempo = tempo_us_per_quarter(bpm)?;
    let timeline = Timeline::from_pattern(pattern);
    let header = Header::new(Format::SingleTrack, Timing::Metrical(timeline.ppq.into()));

    let mut track: Track = Vec::with_capacity(timeline.events.len() + 2);

    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo.into())),
    });

    let mut last_tick = 0u32;
    for event in &timeline.events {
        let delta = event.tick().saturating_sub(last_tick);
        track.push(track_event(delta, event));
        last_tick = event.tick();
    }

    track.push(TrackEvent {
        delta: timeline.length_ticks.saturating_sub(last_tick).into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut smf = Smf::new(header);
    smf.tracks.push(track);

    let mut buffer = Vec::new();
    smf.write(&mut buffer)
        .map_err(|e| Error::Format(format!("Failed to encode MIDI: {}", e)))?;
    Ok(buffer)
}

/// Write one loop of `pattern` to a `.mid` file.
pub fn write_smf<P: AsRef<Path>>(pattern: &Pattern, bpm: f64, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_smf_bytes(pattern, bpm)?;
    std::fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), bpm, "exported MIDI file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_parses_back() {
        let mut pattern = Pattern::new();
        pattern.set_cell(0, 0, true).unwrap();
        pattern.set_cell(1, 2, true).unwrap();

        let bytes = to_smf_bytes(&pattern, 120.0).unwrap();
        let smf = Smf::parse(&bytes).unwrap();

        assert_eq!(smf.header.timing, Timing::Metrical(midly::num::u15::new(4)));
        assert_eq!(smf.tracks.len(), 1);

        let mut tick = 0u32;
        let mut note_ons = Vec::new();
        for event in &smf.tracks[0] {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, .. },
            } = event.kind
            {
                assert_eq!(channel.as_int(), PERCUSSION_CHANNEL);
                note_ons.push((key.as_int(), tick));
            }
        }
        assert_eq!(note_ons, vec![(35, 0), (42, 2)]);
        assert_eq!(tick, 16);
    }

    #[test]
    fn test_export_tempo_meta() {
        let bytes = to_smf_bytes(&Pattern::new(), 120.0).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let tempo = smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        });
        assert_eq!(tempo, Some(500_000));
    }

    #[test]
    fn test_export_rejects_unrepresentable_tempo() {
        for bpm in [0.0, -5.0, 2.0, f64::NAN, f64::INFINITY, 1e9] {
            assert!(
                matches!(to_smf_bytes(&Pattern::new(), bpm), Err(Error::Format(_))),
                "bpm {} should be rejected",
                bpm
            );
        }
    }

    #[test]
    fn test_export_slowest_storable_tempo() {
        // 3.6 BPM needs 16_666_667 us per quarter, just under the 24-bit limit.
        let bytes = to_smf_bytes(&Pattern::new(), 3.6).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let tempo = smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        });
        assert_eq!(tempo, Some(16_666_667));
    }

    #[test]
    fn test_write_smf_rejects_bad_tempo_without_creating_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loop.mid");
        assert!(matches!(
            write_smf(&Pattern::new(), 0.0, &path),
            Err(Error::Format(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_smf_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loop.mid");
        write_smf(&Pattern::new(), 120.0, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
    }
}
