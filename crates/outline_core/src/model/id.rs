//! Opaque identifiers for notes and items.

use uuid::Uuid;

/// Identifier of a note. Caller-provided ids are accepted verbatim.
pub type NoteId = String;

/// Identifier of an item, unique across all notes.
pub type ItemId = String;

/// Returns a fresh random identifier.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}
