//! Release notes: loading from plain-text or JSON files and locale filtering.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Language tag given to notes that come from plain text
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Localized release note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNote {
    /// BCP-47 language tag, e.g. `de-DE`
    pub language: String,
    /// Note text
    pub text: String,
}

impl ReleaseNote {
    /// Create a note
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for ReleaseNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.language, self.text)
    }
}

/// Wrap free text as a single note in the default language
pub fn notes_from_text(text: &str) -> Vec<ReleaseNote> {
    vec![ReleaseNote::new(DEFAULT_LANGUAGE, text)]
}

/// Load release notes from a file.
///
/// Files ending in `.json` hold an array of `{"language": …, "text": …}` objects;
/// any other file is plain text and becomes one note in [`DEFAULT_LANGUAGE`].
pub fn load_release_notes(path: &Path) -> Result<Vec<ReleaseNote>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if !is_json {
        return Ok(notes_from_text(&content));
    }

    let notes: Vec<ReleaseNote> =
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    for note in &notes {
        if !seen.insert(note.language.as_str()) {
            return Err(ConfigError::DuplicateLanguage {
                path: path.to_path_buf(),
                language: note.language.clone(),
            });
        }
    }

    Ok(notes)
}

/// Keep only the notes whose language is listed, preserving their order
pub fn retain_locales(notes: Vec<ReleaseNote>, locales: &[String]) -> Vec<ReleaseNote> {
    notes
        .into_iter()
        .filter(|note| locales.iter().any(|l| l == &note.language))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_plain_text_becomes_default_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", "Bug fixes");
        let notes = load_release_notes(&path).unwrap();
        assert_eq!(notes, vec![ReleaseNote::new("en-US", "Bug fixes")]);
    }

    #[test]
    fn test_json_notes_keep_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "notes.json",
            r#"[{"language":"fr-FR","text":"Corrections"},{"language":"en-US","text":"Fixes"}]"#,
        );
        let notes = load_release_notes(&path).unwrap();
        assert_eq!(notes[0].language, "fr-FR");
        assert_eq!(notes[1].text, "Fixes");
    }

    #[test]
    fn test_duplicate_language_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "notes.json",
            r#"[{"language":"en-US","text":"a"},{"language":"en-US","text":"b"}]"#,
        );
        assert!(matches!(
            load_release_notes(&path),
            Err(ConfigError::DuplicateLanguage { language, .. }) if language == "en-US"
        ));
    }

    #[test]
    fn test_missing_file_is_a_configuration_error() {
        let result = load_release_notes(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }

    #[test]
    fn test_retain_locales_filters_in_order() {
        let notes = vec![
            ReleaseNote::new("en-US", "a"),
            ReleaseNote::new("de-DE", "b"),
            ReleaseNote::new("fr-FR", "c"),
        ];
        let kept = retain_locales(notes, &["de-DE".to_string(), "en-US".to_string()]);
        let languages: Vec<_> = kept.iter().map(|n| n.language.as_str()).collect();
        assert_eq!(languages, vec!["en-US", "de-DE"]);
    }

    #[test]
    fn test_retain_with_empty_filter_keeps_nothing() {
        let notes = vec![ReleaseNote::new("en-US", "a")];
        assert!(retain_locales(notes, &[]).is_empty());
    }
}
