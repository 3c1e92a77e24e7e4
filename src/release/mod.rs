//! Release data model: what gets published, where, and with which notes.

mod notes;
mod request;

pub use notes::{DEFAULT_LANGUAGE, ReleaseNote, load_release_notes, notes_from_text, retain_locales};
pub use request::{ArtifactKind, CountryTargeting, PublishRequest, ReleaseStatus};
