// Chord-transition model: two Markov tables trained from encoded progressions.
//
// The training corpus is plain text, one progression per line, each character
// a digit 1-7 naming a scale degree (tonic = 1). A single pass over each line
// fills two count tables:
//
// - trailing table (8^3 rows): three consecutive degrees -> the degree that
//   followed them. Answers "what comes next" at the end of a progression.
// - surrounding table (8^4 rows): two degrees before a gap and two after ->
//   the degree in the gap. Answers "what fits here" for interior edits.
//
// Row components index at digit value 1-7; value 0 is the reserved "no chord
// there" slot (the edge of a progression, or a label the key does not
// contain). The scan windows differ in span: at position i the trailing
// observation uses digits i-5..i-3 as context, the surrounding observation
// uses digits i-4, i-3 and i-1, i, and both predict the digit at i-2.
//
// Counts are row-normalized once after the scan. The tables are never
// mutated by queries, so a built model can be shared by reference from any
// number of readers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rows in the trailing-context table: (none + 7 degrees) cubed.
const TRAILING_ROWS: usize = 8 * 8 * 8;

/// Rows in the surrounding-context table.
const SURROUNDING_ROWS: usize = 8 * 8 * 8 * 8;

/// First scan position in a line; shorter lines contribute nothing.
const SCAN_START: usize = 5;

/// Bundled training corpus of common progressions, used when the caller has
/// no corpus of their own.
const DEFAULT_CORPUS: &str = include_str!("../data/default_progressions.txt");

/// Errors from loading a corpus file or a saved model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing saved model {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("saved model {path} has tables of the wrong shape")]
    Shape { path: String },
}

/// The trained model: two row-normalized transition tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordMarkovModel {
    /// (prev3, prev2, prev1) -> probability of each next degree.
    trailing: Vec<[f64; 7]>,
    /// (prev2, prev1, next1, next2) -> probability of each degree between.
    surrounding: Vec<[f64; 7]>,
}

impl ChordMarkovModel {
    /// Train a model from corpus text.
    ///
    /// Lines shorter than six digits contribute no observations. Lines
    /// containing any character outside '1'-'7' are skipped whole, with a
    /// warning. An empty corpus is not an error: every row stays zero and
    /// every query returns an empty shortlist.
    pub fn from_corpus_text(text: &str) -> ChordMarkovModel {
        let mut model = ChordMarkovModel {
            trailing: vec![[0.0; 7]; TRAILING_ROWS],
            surrounding: vec![[0.0; 7]; SURROUNDING_ROWS],
        };
        let mut lines = 0usize;
        let mut observations = 0usize;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(degrees) = decode_line(line) else {
                tracing::warn!(line, "skipping corpus line with characters outside 1-7");
                continue;
            };
            lines += 1;
            observations += model.scan(&degrees);
        }
        model.normalize();
        tracing::debug!(lines, observations, "trained chord transition tables");
        model
    }

    /// Train a model from a corpus file.
    pub fn from_corpus_file(path: &Path) -> Result<ChordMarkovModel, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(ChordMarkovModel::from_corpus_text(&text))
    }

    /// The model trained from the bundled corpus.
    pub fn default_model() -> ChordMarkovModel {
        ChordMarkovModel::from_corpus_text(DEFAULT_CORPUS)
    }

    /// Ranked degrees likely to follow the three given degrees.
    ///
    /// `None` means "no chord in that position" (start of a progression, or
    /// a label outside the key). The result is the graded shortlist: every
    /// degree at the row's highest probability in ascending degree order,
    /// then every degree at the second-highest nonzero probability, then the
    /// third. An unobserved context yields an empty list.
    pub fn suggest_trailing(
        &self,
        prev3: Option<u8>,
        prev2: Option<u8>,
        prev1: Option<u8>,
    ) -> Vec<u8> {
        let row = &self.trailing[trailing_row(slot(prev3), slot(prev2), slot(prev1))];
        graded_shortlist(row)
    }

    /// Ranked degrees likely to sit between (prev2, prev1) and (next1, next2).
    ///
    /// Same sentinel handling and shortlist grading as [`suggest_trailing`].
    ///
    /// [`suggest_trailing`]: ChordMarkovModel::suggest_trailing
    pub fn suggest_surrounding(
        &self,
        prev2: Option<u8>,
        prev1: Option<u8>,
        next1: Option<u8>,
        next2: Option<u8>,
    ) -> Vec<u8> {
        let row =
            &self.surrounding[surrounding_row(slot(prev2), slot(prev1), slot(next1), slot(next2))];
        graded_shortlist(row)
    }

    /// Save the trained tables as JSON.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_string(self).map_err(|source| ModelError::Format {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load tables written by [`save`].
    ///
    /// [`save`]: ChordMarkovModel::save
    pub fn load(path: &Path) -> Result<ChordMarkovModel, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model: ChordMarkovModel =
            serde_json::from_str(&text).map_err(|source| ModelError::Format {
                path: path.display().to_string(),
                source,
            })?;
        if model.trailing.len() != TRAILING_ROWS || model.surrounding.len() != SURROUNDING_ROWS {
            return Err(ModelError::Shape {
                path: path.display().to_string(),
            });
        }
        Ok(model)
    }

    /// One pass over a decoded line (digit values 1-7), recording one
    /// observation per table at each scan position. Returns the number of
    /// observations recorded.
    fn scan(&mut self, degrees: &[usize]) -> usize {
        let mut count = 0;
        for i in SCAN_START..degrees.len() {
            let target = degrees[i - 2] - 1;
            self.trailing[trailing_row(degrees[i - 5], degrees[i - 4], degrees[i - 3])]
                [target] += 1.0;
            self.surrounding
                [surrounding_row(degrees[i - 4], degrees[i - 3], degrees[i - 1], degrees[i])]
                [target] += 1.0;
            count += 2;
        }
        count
    }

    /// Divide every row by its own total. Unobserved rows stay all zero.
    fn normalize(&mut self) {
        for row in self.trailing.iter_mut().chain(self.surrounding.iter_mut()) {
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                for p in row.iter_mut() {
                    *p /= total;
                }
            }
        }
    }
}

/// Decode a corpus line into digit values, or `None` if any character is
/// outside '1'-'7'.
fn decode_line(line: &str) -> Option<Vec<usize>> {
    line.chars()
        .map(|c| match c {
            '1'..='7' => Some(c as usize - '0' as usize),
            _ => None,
        })
        .collect()
}

/// Map an optional degree to its row component: 0 = no chord, else degree + 1.
fn slot(degree: Option<u8>) -> usize {
    match degree {
        Some(d) => d as usize + 1,
        None => 0,
    }
}

fn trailing_row(prev3: usize, prev2: usize, prev1: usize) -> usize {
    (prev3 * 8 + prev2) * 8 + prev1
}

fn surrounding_row(prev2: usize, prev1: usize, next1: usize, next2: usize) -> usize {
    ((prev2 * 8 + prev1) * 8 + next1) * 8 + next2
}

/// The graded shortlist of a probability row: all degrees at the top
/// probability (ascending), then at the second-highest distinct nonzero
/// value, then the third. All-zero rows yield an empty list.
fn graded_shortlist(row: &[f64; 7]) -> Vec<u8> {
    let mut first = 0.0;
    let mut second = 0.0;
    let mut third = 0.0;
    for &p in row {
        if p > first {
            third = second;
            second = first;
            first = p;
        } else if p > second && p < first {
            third = second;
            second = p;
        } else if p > third && p < second {
            third = p;
        }
    }

    let mut ranked = Vec::new();
    for tier in [first, second, third] {
        if tier <= 0.0 {
            break;
        }
        for (degree, &p) in row.iter().enumerate() {
            if p == tier {
                ranked.push(degree as u8);
            }
        }
    }
    ranked
}

/// Hand-crafted models for tests here and in the resolver/harmonizer
/// modules; row components are slot values (0 = no chord, else degree + 1).
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub(crate) fn empty_model() -> ChordMarkovModel {
        ChordMarkovModel {
            trailing: vec![[0.0; 7]; TRAILING_ROWS],
            surrounding: vec![[0.0; 7]; SURROUNDING_ROWS],
        }
    }

    pub(crate) fn set_trailing_row(
        model: &mut ChordMarkovModel,
        slots: (usize, usize, usize),
        row: [f64; 7],
    ) {
        model.trailing[trailing_row(slots.0, slots.1, slots.2)] = row;
    }

    pub(crate) fn set_surrounding_row(
        model: &mut ChordMarkovModel,
        slots: (usize, usize, usize, usize),
        row: [f64; 7],
    ) {
        model.surrounding[surrounding_row(slots.0, slots.1, slots.2, slots.3)] = row;
    }
}

#[cfg(test)]
mod tests {
    use super::testing::empty_model;
    use super::*;

    /// Hand-computed scan of the line "1451625163".
    ///
    /// Positions:        0 1 2 3 4 5 6 7 8 9
    /// Digits:           1 4 5 1 6 2 5 1 6 3
    ///
    /// Trailing, i = 5..9: (1,4,5)->1, (4,5,1)->6, (5,1,6)->2, (1,6,2)->5,
    /// (6,2,5)->1. Surrounding: (4,5|6,2)->1, (5,1|2,5)->6, (1,6|5,1)->2,
    /// (6,2|1,6)->5, (2,5|6,3)->1.
    #[test]
    fn test_golden_single_line_counts() {
        let model = ChordMarkovModel::from_corpus_text("1451625163");

        // Each trailing context occurs once, so its row normalizes to a
        // single 1.0 at the observed target (digit - 1).
        assert_eq!(model.trailing[trailing_row(1, 4, 5)][0], 1.0);
        assert_eq!(model.trailing[trailing_row(4, 5, 1)][5], 1.0);
        assert_eq!(model.trailing[trailing_row(5, 1, 6)][1], 1.0);
        assert_eq!(model.trailing[trailing_row(1, 6, 2)][4], 1.0);
        assert_eq!(model.trailing[trailing_row(6, 2, 5)][0], 1.0);

        assert_eq!(model.surrounding[surrounding_row(4, 5, 6, 2)][0], 1.0);
        assert_eq!(model.surrounding[surrounding_row(5, 1, 2, 5)][5], 1.0);
        assert_eq!(model.surrounding[surrounding_row(1, 6, 5, 1)][1], 1.0);
        assert_eq!(model.surrounding[surrounding_row(6, 2, 1, 6)][4], 1.0);
        assert_eq!(model.surrounding[surrounding_row(2, 5, 6, 3)][0], 1.0);
    }

    #[test]
    fn test_observed_rows_normalize_to_one() {
        // Row (1,1,1) sees target 2 twice and target 3 once.
        let model = ChordMarkovModel::from_corpus_text("1112111\n1113111\n1112111");
        let row = &model.trailing[trailing_row(1, 1, 1)];
        let total: f64 = row.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "row sums to {total}");
        assert!((row[1] - 2.0 / 3.0).abs() < 1e-9);
        assert!((row[2] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_suggestions_use_zero_based_degrees() {
        let model = ChordMarkovModel::from_corpus_text("1451625163");
        // Degrees 0,3,4 are digits 1,4,5; the observed follower is degree 0.
        assert_eq!(
            model.suggest_trailing(Some(0), Some(3), Some(4)),
            vec![0]
        );
    }

    #[test]
    fn test_graded_shortlist_tiers_ascending_within_tier() {
        let mut model = empty_model();
        model.trailing[trailing_row(0, 0, 0)] = [0.5, 0.5, 0.2, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(model.suggest_trailing(None, None, None), vec![0, 1, 2]);
    }

    #[test]
    fn test_graded_shortlist_three_tiers() {
        let mut model = empty_model();
        model.surrounding[surrounding_row(0, 0, 0, 0)] =
            [0.1, 0.5, 0.25, 0.5, 0.0, 0.1, 0.05];
        assert_eq!(
            model.suggest_surrounding(None, None, None, None),
            vec![1, 3, 2, 0, 5]
        );
    }

    #[test]
    fn test_unobserved_context_yields_nothing() {
        let model = ChordMarkovModel::from_corpus_text("1451625163");
        assert!(model.suggest_trailing(Some(6), Some(6), Some(6)).is_empty());
    }

    #[test]
    fn test_empty_corpus_is_fully_degenerate() {
        let model = ChordMarkovModel::from_corpus_text("");
        assert!(model.suggest_trailing(None, None, Some(0)).is_empty());
        assert!(
            model
                .suggest_surrounding(Some(0), Some(1), Some(2), Some(3))
                .is_empty()
        );
    }

    #[test]
    fn test_short_lines_contribute_nothing() {
        let model = ChordMarkovModel::from_corpus_text("14516\n145\n1");
        assert!(model.trailing.iter().all(|row| row.iter().all(|&p| p == 0.0)));
        assert!(model.surrounding.iter().all(|row| row.iter().all(|&p| p == 0.0)));
    }

    #[test]
    fn test_malformed_lines_are_skipped_whole() {
        let model = ChordMarkovModel::from_corpus_text("145x625163\n1451625163");
        // Only the clean line trains; its counts match the golden scan.
        assert_eq!(model.trailing[trailing_row(1, 4, 5)][0], 1.0);
        // Digit 8/9 and 0 are outside the alphabet too.
        let model = ChordMarkovModel::from_corpus_text("1451625198\n1450625163");
        assert!(model.trailing.iter().all(|row| row.iter().all(|&p| p == 0.0)));
    }

    #[test]
    fn test_default_model_has_observations() {
        let model = ChordMarkovModel::default_model();
        let any = model
            .trailing
            .iter()
            .any(|row| row.iter().any(|&p| p > 0.0));
        assert!(any, "bundled corpus should train at least one row");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let model = ChordMarkovModel::from_corpus_text("1451625163");
        let json = serde_json::to_string(&model).unwrap();
        let restored: ChordMarkovModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.trailing, model.trailing);
        assert_eq!(restored.surrounding, model.surrounding);
    }
}
