//! Queued repository writes with their payload snapshots.

use crate::model::id::{ItemId, NoteId};
use crate::repo::outline_repo::{ItemChanges, NoteChanges, OutlineRepository, RepoResult};

/// One deferred repository write.
///
/// Payloads are captured when the write is scheduled; later edits to the
/// live model do not leak into an already queued write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    PatchNote {
        note_id: NoteId,
        changes: NoteChanges,
    },
    /// Deletes the note row and every item row it owns.
    DeleteNote { note_id: NoteId },
    PatchItem {
        item_id: ItemId,
        changes: ItemChanges,
    },
    DeleteItem { item_id: ItemId },
}

impl WriteOp {
    /// Coalescing key. Notes and items live in separate key spaces.
    pub fn key(&self) -> String {
        match self {
            Self::PatchNote { note_id, .. } | Self::DeleteNote { note_id } => {
                note_key(note_id)
            }
            Self::PatchItem { item_id, .. } | Self::DeleteItem { item_id } => {
                item_key(item_id)
            }
        }
    }

    /// Stable name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PatchNote { .. } => "patch_note",
            Self::DeleteNote { .. } => "delete_note",
            Self::PatchItem { .. } => "patch_item",
            Self::DeleteItem { .. } => "delete_item",
        }
    }

    /// Runs this write against `repo`.
    pub fn apply<R: OutlineRepository + ?Sized>(&self, repo: &R) -> RepoResult<()> {
        match self {
            Self::PatchNote { note_id, changes } => repo.patch_note(note_id, changes),
            Self::DeleteNote { note_id } => {
                repo.delete_note(note_id)?;
                repo.delete_items_of_note(note_id)?;
                Ok(())
            }
            Self::PatchItem { item_id, changes } => repo.patch_item(item_id, changes),
            Self::DeleteItem { item_id } => repo.delete_item(item_id),
        }
    }
}

pub fn note_key(note_id: &str) -> String {
    format!("note:{note_id}")
}

pub fn item_key(item_id: &str) -> String {
    format!("item:{item_id}")
}
