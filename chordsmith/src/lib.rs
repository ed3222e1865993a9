// Chordsmith: chord progression and melody harmonization suggestions.
//
// The engine helps a composer working in one key: given a progression being
// edited, it suggests plausible chords for any position; given a grid of
// melody notes, it picks a chord per beat, half measure, or measure to fit
// them. Suggestions come from two Markov transition tables trained offline
// on a corpus of encoded progressions; melody harmonization is a
// deterministic weight scorer that consults the tables only to break ties.
//
// Architecture:
// - key.rs: enharmonic spelling table, key resolution, diatonic chord sets
// - markov.rs: corpus training, transition tables, graded shortlist queries
// - progression.rs: the editable progression + context-window suggestions
// - melody.rs: the note grid + window-scoring harmonizer
// - storage.rs: the line-oriented progression file format
//
// The model is built once, stays immutable, and is threaded by reference
// into everything that queries it. The only randomness in the engine is the
// harmonizer's last-resort tie-break, drawn from a caller-supplied
// generator, so seeded runs reproduce exactly.

pub mod key;
pub mod markov;
pub mod melody;
pub mod progression;
pub mod storage;

pub use key::{ChordQuality, DiatonicKey};
pub use markov::{ChordMarkovModel, ModelError};
pub use melody::{ChordFrequency, MelodyGrid, harmonize};
pub use progression::Progression;
pub use storage::StorageError;
