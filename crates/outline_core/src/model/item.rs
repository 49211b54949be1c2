//! Outline item record.
//!
//! # Invariants
//! - `id` is unique system-wide; it is never reused after a collapsed item
//!   is expanded again (expand issues a new id).
//! - `collapsed` holds the hidden subtree with levels relative to this item.

use super::id::{ItemId, NoteId};
use serde::{Deserialize, Serialize};

/// One outline row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Owning note. Back-reference only.
    pub note_id: NoteId,
    pub title: String,
    /// Indentation depth; a child sits at `parent.level + 1`.
    pub level: u32,
    /// Sort key within the note's flattened sequence.
    pub position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    /// Subtree hidden by a collapse. Empty while expanded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collapsed: Vec<Item>,
}

impl Item {
    /// Creates an untitled, expanded item.
    pub fn new(id: ItemId, note_id: NoteId, level: u32, position: f64) -> Self {
        Self {
            id,
            note_id,
            title: String::new(),
            level,
            position,
            done: None,
            collapsed: Vec::new(),
        }
    }

    /// Returns whether the title has no visible text.
    ///
    /// Blank items are dropped on load and their rows deleted.
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }

    pub fn is_collapsed(&self) -> bool {
        !self.collapsed.is_empty()
    }
}
