// Progression editing and context-window suggestions.
//
// A progression is an ordered list of chord labels in one key. Positions may
// hold a placeholder empty label while an edit is in flight; an empty label
// resolves to "no chord there", the same as a position past either end.
//
// Suggestion queries assemble the context window around the edited position
// and ask the transition model: the three trailing chords when the position
// is the last one, the two on each side when it is interior. Degrees come
// back in graded order and are mapped to labels of the owning key.

use serde::{Deserialize, Serialize};

use crate::key::DiatonicKey;
use crate::markov::ChordMarkovModel;

/// A chord progression in a resolved key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progression {
    key: DiatonicKey,
    chords: Vec<String>,
}

impl Progression {
    /// An empty progression in the given key.
    pub fn new(key: DiatonicKey) -> Progression {
        Progression {
            key,
            chords: Vec::new(),
        }
    }

    /// A progression with existing chords (the load path).
    pub fn with_chords(key: DiatonicKey, chords: Vec<String>) -> Progression {
        Progression { key, chords }
    }

    /// The key this progression is composed in.
    pub fn key(&self) -> &DiatonicKey {
        &self.key
    }

    /// The chord labels in order.
    pub fn chords(&self) -> &[String] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// Overwrite the chord at a position. Panics if out of bounds.
    pub fn set(&mut self, index: usize, label: &str) {
        self.chords[index] = label.to_string();
    }

    /// Append a chord (possibly the placeholder empty label).
    pub fn push(&mut self, label: &str) {
        self.chords.push(label.to_string());
    }

    /// Remove the chord at a position. Panics if out of bounds.
    pub fn remove(&mut self, index: usize) {
        self.chords.remove(index);
    }

    /// Remove and return the last chord, if any.
    pub fn pop(&mut self) -> Option<String> {
        self.chords.pop()
    }

    /// Suggested chord labels for a position, best tiers first.
    ///
    /// At the last position the trailing window (index-3..index-1) feeds the
    /// model; at an interior position the surrounding window (two before,
    /// two after). An interior query requires the chord at index+1 to exist;
    /// that is the caller's contract, not checked in release builds. An
    /// empty result means the model has no data for this context; callers
    /// typically fall back to offering the key's full chord set.
    pub fn suggest_at(&self, index: usize, model: &ChordMarkovModel) -> Vec<String> {
        let prev2 = self.degree_at(index as isize - 2);
        let prev1 = self.degree_at(index as isize - 1);

        let degrees = if index + 1 == self.chords.len() {
            let prev3 = self.degree_at(index as isize - 3);
            model.suggest_trailing(prev3, prev2, prev1)
        } else {
            debug_assert!(
                index + 1 < self.chords.len(),
                "interior suggestion at {index} needs a following chord"
            );
            let next1 = self.degree_at(index as isize + 1);
            let next2 = self.degree_at(index as isize + 2);
            model.suggest_surrounding(prev2, prev1, next1, next2)
        };

        degrees
            .into_iter()
            .map(|degree| self.key.chord(degree as usize).to_string())
            .collect()
    }

    /// The degree of the chord at a position; `None` when the position is
    /// out of bounds or the label is not a chord of the key.
    fn degree_at(&self, index: isize) -> Option<u8> {
        if index < 0 {
            return None;
        }
        let label = self.chords.get(index as usize)?;
        self.key.degree_of(label)
    }
}
