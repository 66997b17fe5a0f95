//! Pattern Tool - Console utility for inspecting saved patterns
//!
//! Prints the grid and the compiled event list of a pattern file, and can
//! export it as a Standard MIDI File.
//!
//! Usage: cargo run --bin pattern_tool -- <pattern.yaml> [--export <out.mid>] [--bpm <n>]

use anyhow::{bail, Context, Result};

use beatbox::compiler::{compile, TimedEvent};
use beatbox::export::write_smf;
use beatbox::instrument::INSTRUMENTS;
use beatbox::pattern::{Pattern, DEFAULT_BPM};
use beatbox::store;

fn main() -> Result<()> {
    beatbox::init_logging();

    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1).filter(|a| !a.starts_with("--")) else {
        bail!("Usage: pattern_tool <pattern.yaml> [--export <out.mid>] [--bpm <n>]");
    };

    let export_path = flag_value(&args, "--export");
    let bpm: f64 = match flag_value(&args, "--bpm") {
        Some(s) => s.parse().with_context(|| format!("Invalid --bpm value: {}", s))?,
        None => DEFAULT_BPM,
    };

    let serialized =
        store::load(path).with_context(|| format!("Failed to load pattern {}", path))?;
    let mut pattern = Pattern::new();
    pattern.load_serialized(&serialized);

    println!("=== {} ===\n", path);
    print_grid(&pattern);
    println!();
    print_events(&compile(&pattern));

    if let Some(out) = export_path {
        write_smf(&pattern, bpm, out).with_context(|| format!("Failed to export {}", out))?;
        println!("\nExported to {} at {:.1} BPM", out, bpm);
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn print_grid(pattern: &Pattern) {
    println!("{:<16} {}", "INSTRUMENT", "1 . . . 2 . . . 3 . . . 4 . . .");
    println!("{}", "-".repeat(48));
    for (instrument, steps) in INSTRUMENTS.iter().zip(pattern.rows()) {
        let cells: Vec<&str> = steps.iter().map(|&on| if on { "x" } else { "." }).collect();
        println!("{:<16} {}", instrument.name, cells.join(" "));
    }
    println!("\n{} active cells", pattern.active_cells());
}

fn print_events(events: &[TimedEvent]) {
    println!("{:<6} {:<16} {:<12} {}", "TICK", "TYPE", "DATA (HEX)", "DETAILS");
    println!("{}", "-".repeat(60));
    for event in events {
        let hex: String = event
            .to_midi_message()
            .iter()
            .map(|b| format!("{:02X} ", b))
            .collect();
        let (kind, details) = describe(event);
        println!("{:<6} {:<16} {:<12} {}", event.tick(), kind, hex.trim(), details);
    }
}

fn describe(event: &TimedEvent) -> (&'static str, String) {
    match *event {
        TimedEvent::NoteOn { key, velocity, .. } => {
            ("NOTE_ON", format!("{} Vel:{}", key_name(key), velocity))
        }
        TimedEvent::NoteOff { key, velocity, .. } => {
            ("NOTE_OFF", format!("{} Vel:{}", key_name(key), velocity))
        }
        TimedEvent::ControlChange { channel, value, .. } => {
            ("CONTROL_CHANGE", format!("Ch:{} Val:{}", channel + 1, value))
        }
    }
}

fn key_name(key: u8) -> String {
    INSTRUMENTS
        .iter()
        .find(|i| i.sound_code == key)
        .map(|i| i.name.to_string())
        .unwrap_or_else(|| format!("Key {}", key))
}
