// Chordsmith CLI.
//
// Suggest chords for a saved progression, list a key's chords, or harmonize
// a melody pattern.
//
// Usage:
//   cargo run -p chordsmith -- progression.txt [--index N]
//   cargo run -p chordsmith -- --key C
//   cargo run -p chordsmith -- --key C --melody "1...3...5...3..." --freq 2
//   common flags: [--corpus PATH] [--seed N]
//
// Melody patterns are one character per sixteenth-note slot: digits 1-7
// select a scale degree, '.' leaves the slot empty; the length must be a
// whole number of 16-slot measures.

use std::path::Path;
use std::process::exit;

use chordsmith::melody::SLOTS_PER_MEASURE;
use chordsmith::{ChordFrequency, ChordMarkovModel, DiatonicKey, MelodyGrid, harmonize, storage};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let file = args.get(1).filter(|s| !s.starts_with("--")).cloned();
    let index: Option<usize> = parse_flag(&args, "--index");
    let key_name: Option<String> = parse_flag(&args, "--key");
    let melody: Option<String> = parse_flag(&args, "--melody");
    let freq: usize = parse_flag(&args, "--freq").unwrap_or(1);
    let corpus: Option<String> = parse_flag(&args, "--corpus");
    let seed: Option<u64> = parse_flag(&args, "--seed");

    // Build the model once, up front.
    let model = match &corpus {
        Some(path) => match ChordMarkovModel::from_corpus_file(Path::new(path)) {
            Ok(model) => {
                println!("Trained from {path}.");
                model
            }
            Err(e) => {
                eprintln!("Failed to read corpus: {e}");
                exit(1);
            }
        },
        None => ChordMarkovModel::default_model(),
    };

    // The working key comes from the progression file or from --key.
    let (key, progression) = if let Some(path) = &file {
        match storage::load_progression(Path::new(path)) {
            Ok(prog) => (prog.key().clone(), Some(prog)),
            Err(e) => {
                eprintln!("Failed to load {path}: {e}");
                exit(1);
            }
        }
    } else if let Some(name) = &key_name {
        match DiatonicKey::resolve(name) {
            Some(key) => (key, None),
            None => {
                eprintln!("Unknown key '{name}'. Use names like C, F♯, B♭, or Am.");
                exit(1);
            }
        }
    } else {
        usage();
        exit(1);
    };

    println!("Key: {}", key.name());
    println!("Chords: {}", key.chords().join(", "));

    if let Some(prog) = &progression {
        println!("Progression: {}", prog.chords().join(" "));
        let at = match index {
            Some(i) => i,
            None => prog.len().saturating_sub(1),
        };
        if at >= prog.len() {
            eprintln!("Position {at} is outside the progression (length {}).", prog.len());
            exit(1);
        }

        let suggestions = prog.suggest_at(at, &model);
        if suggestions.is_empty() {
            println!("No data for position {at}; any chord of the key works:");
            println!("  {}", key.chords().join(", "));
        } else {
            println!("Suggested for position {at}:");
            for (rank, chord) in suggestions.iter().enumerate() {
                println!("  {}. {chord}", rank + 1);
            }
        }
    }

    if let Some(pattern) = &melody {
        let grid = match parse_pattern(pattern) {
            Ok(grid) => grid,
            Err(msg) => {
                eprintln!("Bad melody pattern: {msg}");
                exit(1);
            }
        };
        let frequency = match freq {
            1 => ChordFrequency::Beat,
            2 => ChordFrequency::HalfMeasure,
            4 => ChordFrequency::Measure,
            other => {
                eprintln!("--freq must be 1, 2, or 4 (got {other}).");
                exit(1);
            }
        };
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };

        let harmony = harmonize(&grid, frequency, &key, &model, &mut rng);
        println!(
            "Harmony ({} measures, one chord per {} beat(s)): {}",
            grid.measures(),
            frequency as usize,
            harmony.join(" ")
        );
    }
}

/// Decode a melody pattern: '1'-'7' selects a degree, '.' an empty slot.
fn parse_pattern(pattern: &str) -> Result<MelodyGrid, String> {
    let slots: Vec<char> = pattern.chars().collect();
    if slots.is_empty() || slots.len() % SLOTS_PER_MEASURE != 0 {
        return Err(format!(
            "length {} is not a whole number of {SLOTS_PER_MEASURE}-slot measures",
            slots.len()
        ));
    }
    let mut grid = MelodyGrid::with_measures(slots.len() / SLOTS_PER_MEASURE);
    for (i, c) in slots.iter().enumerate() {
        match c {
            '.' => {}
            '1'..='7' => grid.set_note(i, *c as u8 - b'1'),
            other => return Err(format!("character {other:?} at slot {i}")),
        }
    }
    Ok(grid)
}

fn usage() {
    eprintln!("Usage:");
    eprintln!("  chordsmith progression.txt [--index N]");
    eprintln!("  chordsmith --key NAME");
    eprintln!("  chordsmith --key NAME --melody PATTERN --freq 1|2|4");
    eprintln!("  common flags: [--corpus PATH] [--seed N]");
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
