// Progression files: the line-oriented save format.
//
// Line one names the key (a spelling-table entry, optional minor suffix);
// every following line is one chord label in progression order. A blank
// chord line round-trips as the placeholder empty label.

use std::path::Path;

use thiserror::Error;

use crate::key::DiatonicKey;
use crate::progression::Progression;

/// Errors from reading or writing progression files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("progression file is empty (missing the key line)")]
    MissingKey,
    #[error("unknown key {name:?}")]
    UnknownKey { name: String },
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse progression-file text.
pub fn parse_progression(text: &str) -> Result<Progression, StorageError> {
    let mut lines = text.lines();
    let name = lines.next().ok_or(StorageError::MissingKey)?;
    let key = DiatonicKey::resolve(name).ok_or_else(|| StorageError::UnknownKey {
        name: name.to_string(),
    })?;
    let chords = lines.map(str::to_string).collect();
    Ok(Progression::with_chords(key, chords))
}

/// Render a progression in the save format.
pub fn format_progression(progression: &Progression) -> String {
    let mut out = String::new();
    out.push_str(progression.key().name());
    out.push('\n');
    for chord in progression.chords() {
        out.push_str(chord);
        out.push('\n');
    }
    out
}

/// Load a progression from a file.
pub fn load_progression(path: &Path) -> Result<Progression, StorageError> {
    let text = std::fs::read_to_string(path).map_err(|source| StorageError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let progression = parse_progression(&text)?;
    tracing::debug!(
        path = %path.display(),
        chords = progression.len(),
        "loaded progression"
    );
    Ok(progression)
}

/// Save a progression to a file.
pub fn save_progression(path: &Path, progression: &Progression) -> Result<(), StorageError> {
    std::fs::write(path, format_progression(progression)).map_err(|source| StorageError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        chords = progression.len(),
        "saved progression"
    );
    Ok(())
}
