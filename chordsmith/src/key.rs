// Key resolution: the enharmonic spelling table and diatonic chord sets.
//
// A key name ("C", "F♯", "E♭m", ...) resolves to the seven diatonic chords
// of that key, spelled with the letter names a musician expects in context
// (C♯ major gets an E♯, not an F). The 33-slot spelling cycle interleaves
// plain, sharp, double-sharp, flat, and double-flat names so that the fixed
// degree offsets below always land on the idiomatic spelling for the key.
//
// Minor keys resolve through their relative major: strip the minor suffix,
// find the tonic's slot, rotate nine slots forward, and generate from there
// ("Am" yields the same seven chords as "C").
//
// Degrees run 0-6, tonic through leading tone. The quality at each degree is
// the same in every key; only the spelled roots change.

use serde::{Deserialize, Serialize};

/// The spelling cycle. The two blank slots sit where no enharmonic name
/// exists (between E♯ and F♭, and between B♯ and C♭); they are spacing, not
/// names, and never match a lookup.
const SPELLING_TABLE: [&str; 33] = [
    "C", "C♯", "C♯♯", "D♭♭", "D♭", "D", "D♯", "D♯♯", "E♭♭",
    "E♭", "E", "E♯", "", "F♭", "F", "F♯", "F♯♯", "G♭♭", "G♭",
    "G", "G♯", "G♯♯", "A♭♭", "A♭", "A", "A♯", "A♯♯", "B♭♭",
    "B♭", "B", "B♯", "", "C♭",
];

/// Table-slot offsets from the tonic slot to each diatonic chord root.
const DEGREE_OFFSETS: [usize; 7] = [0, 5, 10, 14, 19, 24, 29];

/// Slots from a minor tonic forward to its relative major.
const RELATIVE_MAJOR_ROTATION: usize = 9;

/// Suffix marking a minor key name ("Am", "F♯m").
const MINOR_SUFFIX: &str = "m";

/// Chord quality at a diatonic degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
}

impl ChordQuality {
    /// Quality per degree 0-6, identical in every key.
    pub const BY_DEGREE: [ChordQuality; 7] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Minor,
        ChordQuality::Major,
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
    ];

    /// The label suffix for this quality ("Dm", "B°").
    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "°",
        }
    }
}

/// A resolved key: the name it was resolved from plus its seven chord labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiatonicKey {
    name: String,
    chords: [String; 7],
}

impl DiatonicKey {
    /// Resolve a key name to its diatonic chord set.
    ///
    /// Returns `None` when the base name (minus any minor suffix) is not a
    /// spelling-table entry. Callers are expected to offer only table names;
    /// `None` signals a caller mistake, not a state the engine recovers from.
    pub fn resolve(key: &str) -> Option<DiatonicKey> {
        let (base, rotation) = match key.strip_suffix(MINOR_SUFFIX) {
            Some(base) => (base, RELATIVE_MAJOR_ROTATION),
            None => (key, 0),
        };
        let tonic = (table_slot(base)? + rotation) % SPELLING_TABLE.len();
        let chords = std::array::from_fn(|degree| {
            let slot = (tonic + DEGREE_OFFSETS[degree]) % SPELLING_TABLE.len();
            format!("{}{}", SPELLING_TABLE[slot], ChordQuality::BY_DEGREE[degree].suffix())
        });
        Some(DiatonicKey {
            name: key.to_string(),
            chords,
        })
    }

    /// The name this key was resolved from, minor suffix included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The chord label at a degree. Panics if `degree > 6`.
    pub fn chord(&self, degree: usize) -> &str {
        &self.chords[degree]
    }

    /// The degree of a chord label in this key, or `None` when the label is
    /// not one of the seven (a placeholder empty label included).
    pub fn degree_of(&self, label: &str) -> Option<u8> {
        if label.is_empty() {
            return None;
        }
        self.chords.iter().position(|c| c == label).map(|d| d as u8)
    }

    /// All seven chords in degree order.
    pub fn chords(&self) -> &[String; 7] {
        &self.chords
    }
}

/// A name's slot in the spelling table. Blank slots never match.
fn table_slot(name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    SPELLING_TABLE.iter().position(|&entry| entry == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(key: &DiatonicKey) -> Vec<&str> {
        key.chords().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_c_major_chord_set() {
        let key = DiatonicKey::resolve("C").unwrap();
        assert_eq!(labels(&key), ["C", "Dm", "Em", "F", "G", "Am", "B°"]);
    }

    #[test]
    fn test_sharp_key_uses_sharp_spellings() {
        let key = DiatonicKey::resolve("D").unwrap();
        assert_eq!(labels(&key), ["D", "Em", "F♯m", "G", "A", "Bm", "C♯°"]);
    }

    #[test]
    fn test_flat_key_uses_flat_spellings() {
        let key = DiatonicKey::resolve("E♭").unwrap();
        assert_eq!(labels(&key), ["E♭", "Fm", "Gm", "A♭", "B♭", "Cm", "D°"]);
    }

    #[test]
    fn test_relative_minor_matches_major() {
        let am = DiatonicKey::resolve("Am").unwrap();
        let c = DiatonicKey::resolve("C").unwrap();
        assert_eq!(am.chords(), c.chords());

        let fsm = DiatonicKey::resolve("F♯m").unwrap();
        let a = DiatonicKey::resolve("A").unwrap();
        assert_eq!(fsm.chords(), a.chords());
    }

    #[test]
    fn test_minor_key_keeps_its_name() {
        let key = DiatonicKey::resolve("Am").unwrap();
        assert_eq!(key.name(), "Am");
    }

    #[test]
    fn test_quality_pattern_holds_for_every_table_name() {
        use ChordQuality::*;
        for name in SPELLING_TABLE.iter().filter(|n| !n.is_empty()) {
            for key_name in [name.to_string(), format!("{name}m")] {
                let key = DiatonicKey::resolve(&key_name)
                    .unwrap_or_else(|| panic!("{key_name} should resolve"));
                for (degree, quality) in ChordQuality::BY_DEGREE.iter().enumerate() {
                    let label = key.chord(degree);
                    let ok = match quality {
                        Major => !label.ends_with('m') && !label.ends_with('°'),
                        Minor => label.ends_with('m'),
                        Diminished => label.ends_with('°'),
                    };
                    assert!(ok, "{key_name} degree {degree}: bad quality for {label:?}");
                }
            }
        }
    }

    #[test]
    fn test_degree_of_roundtrip() {
        let key = DiatonicKey::resolve("G").unwrap();
        for degree in 0..7 {
            assert_eq!(key.degree_of(key.chord(degree)), Some(degree as u8));
        }
    }

    #[test]
    fn test_degree_of_rejects_foreign_labels() {
        let key = DiatonicKey::resolve("C").unwrap();
        // D major is not diatonic in C (Dm is).
        assert_eq!(key.degree_of("D"), None);
        assert_eq!(key.degree_of("B♭"), None);
        assert_eq!(key.degree_of(""), None);
    }

    #[test]
    fn test_unknown_names_do_not_resolve() {
        assert!(DiatonicKey::resolve("H").is_none());
        assert!(DiatonicKey::resolve("c").is_none());
        assert!(DiatonicKey::resolve("C#").is_none()); // ASCII sharp is not a table name
        assert!(DiatonicKey::resolve("").is_none());
        assert!(DiatonicKey::resolve("m").is_none());
    }
}
