// Melody grid and harmonization.
//
// The melody is a row of sixteenth-note slots, each empty or holding a scale
// degree, grown and trimmed a whole 4/4 measure (16 slots) at a time.
// Harmonization walks the grid in fixed windows (a beat, a half measure, or
// a measure per chord) and scores the seven diatonic chords against the
// notes in each window:
//
// - a note on an odd sixteenth that differs from the slot before it is
//   passing or neighboring motion: it credits the two chords a step away
//   and nothing to its own;
// - any other note is a chord tone: its own chord is credited most and the
//   four chords holding it as a third or fifth slightly less, with extra
//   weight on downbeats and backbeats.
//
// The heaviest chord wins the window. Ties are broken by asking the
// transition model what usually follows the harmony chosen so far, and
// failing that, uniformly at random from the caller's generator. A seeded
// generator makes the whole run reproducible.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::key::DiatonicKey;
use crate::markov::ChordMarkovModel;

/// Sixteenth-note slots per beat.
pub const SLOTS_PER_BEAT: usize = 4;

/// Slots per 4/4 measure.
pub const SLOTS_PER_MEASURE: usize = 4 * SLOTS_PER_BEAT;

/// Starting weight per degree: the common I, IV, and V chords get a head
/// start, vi a smaller one, and vii° starts behind.
const SEED_WEIGHTS: [i32; 7] = [2, 0, 0, 2, 2, 1, -1];

/// How many beats each harmony chord spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordFrequency {
    Beat = 1,
    HalfMeasure = 2,
    Measure = 4,
}

impl ChordFrequency {
    /// Slots combined into one harmonized chord.
    pub fn subdivision(self) -> usize {
        self as usize * SLOTS_PER_BEAT
    }
}

/// A melody as note slots, a whole number of measures at all times.
///
/// New grids start with one empty measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MelodyGrid {
    slots: Vec<Option<u8>>,
}

impl Default for MelodyGrid {
    fn default() -> MelodyGrid {
        MelodyGrid::new()
    }
}

impl MelodyGrid {
    pub fn new() -> MelodyGrid {
        MelodyGrid::with_measures(1)
    }

    pub fn with_measures(measures: usize) -> MelodyGrid {
        MelodyGrid {
            slots: vec![None; measures * SLOTS_PER_MEASURE],
        }
    }

    /// Total slot count.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn measures(&self) -> usize {
        self.slots.len() / SLOTS_PER_MEASURE
    }

    /// Append one empty measure.
    pub fn add_measure(&mut self) {
        self.slots.resize(self.slots.len() + SLOTS_PER_MEASURE, None);
    }

    /// Drop the last measure and its notes. The last remaining measure
    /// always stays; returns whether anything was removed.
    pub fn remove_measure(&mut self) -> bool {
        if self.slots.len() <= SLOTS_PER_MEASURE {
            return false;
        }
        self.slots.truncate(self.slots.len() - SLOTS_PER_MEASURE);
        true
    }

    /// The degree selected at a slot, if any. Panics if out of bounds.
    pub fn note(&self, slot: usize) -> Option<u8> {
        self.slots[slot]
    }

    /// Select a degree at a slot. Panics if the slot is out of bounds or the
    /// degree is not 0-6.
    pub fn set_note(&mut self, slot: usize, degree: u8) {
        assert!(degree < 7, "degree {degree} out of range");
        self.slots[slot] = Some(degree);
    }

    /// Clear the note at a slot.
    pub fn clear_note(&mut self, slot: usize) {
        self.slots[slot] = None;
    }
}

/// Harmonize a melody: one chord label per window of `frequency` beats.
///
/// Windows are scored independently; only the tie-break context (the
/// harmony chosen so far) and the slot just before each window carry over.
/// Trailing slots short of a full window are ignored; grids grow in whole
/// measures, so every frequency divides them evenly.
pub fn harmonize(
    grid: &MelodyGrid,
    frequency: ChordFrequency,
    key: &DiatonicKey,
    model: &ChordMarkovModel,
    rng: &mut impl Rng,
) -> Vec<String> {
    let subdivision = frequency.subdivision();
    let mut degrees: Vec<u8> = Vec::with_capacity(grid.len() / subdivision);

    for window in 0..grid.len() / subdivision {
        let weights = window_weights(grid, window * subdivision, subdivision);
        degrees.push(choose_degree(&weights, &degrees, model, rng));
    }

    degrees
        .iter()
        .map(|&d| key.chord(d as usize).to_string())
        .collect()
}

/// Score the seven chords against the notes of one window.
fn window_weights(grid: &MelodyGrid, anchor: usize, subdivision: usize) -> [i32; 7] {
    let mut weights = SEED_WEIGHTS;
    // The slot before the window seeds the passing-motion comparison; the
    // comparison tracks the previous slot's raw state, so a note right
    // after an empty slot is never passing.
    let mut prev = if anchor > 0 { grid.note(anchor - 1) } else { None };

    for j in 0..subdivision {
        let slot = grid.note(anchor + j);
        if let Some(degree) = slot {
            let d = degree as usize;
            if j % 2 == 1 && prev.is_some() && prev != Some(degree) {
                // Passing or neighboring motion: credit the step neighbors.
                weights[(d + 1) % 7] += 1;
                weights[(d + 6) % 7] += 1;
            } else {
                // Chord tone. Downbeats weigh most, backbeats second.
                let base = match j % 4 {
                    0 => 2,
                    2 => 1,
                    _ => 0,
                };
                weights[d] += base + 2;
                // The four chords holding this degree as a third or fifth.
                weights[(d + 2) % 7] += base + 1;
                weights[(d + 4) % 7] += base + 1;
                weights[(d + 5) % 7] += base + 1;
                weights[(d + 3) % 7] += base + 1;
            }
        }
        prev = slot;
    }
    weights
}

/// Pick the heaviest degree; break ties through the model, then the RNG.
fn choose_degree(
    weights: &[i32; 7],
    harmony: &[u8],
    model: &ChordMarkovModel,
    rng: &mut impl Rng,
) -> u8 {
    let max_weight = weights.iter().copied().fold(i32::MIN, i32::max);
    let tied: Vec<u8> = (0u8..7).filter(|&d| weights[d as usize] == max_weight).collect();
    if tied.len() == 1 {
        return tied[0];
    }

    // Prefer whichever tied chord most often follows the harmony so far.
    let n = harmony.len();
    let context = |back: usize| n.checked_sub(back).map(|i| harmony[i]);
    for candidate in model.suggest_trailing(context(3), context(2), context(1)) {
        if weights[candidate as usize] == max_weight {
            return candidate;
        }
    }

    tied[rng.random_range(0..tied.len())]
}
