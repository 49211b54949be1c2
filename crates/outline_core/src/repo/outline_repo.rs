//! Outline repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist note rows `{id, title, date}` and item rows
//!   `{id, note_id, title, level, position, done, collapsed}`.
//! - Translate SQLite failures into semantic repository errors.
//!
//! # Invariants
//! - Note and item records are indexed independently by id; there is no
//!   foreign key between them.
//! - Read paths reject malformed rows instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::id::{ItemId, NoteId};
use crate::model::item::Item;
use crate::model::note::Note;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    note_id,
    title,
    level,
    position,
    done,
    collapsed
FROM items";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from outline persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A note with this id is already stored.
    NoteAlreadyExists(NoteId),
    /// Patch target note is not stored.
    NoteNotFound(NoteId),
    /// Patch target item is not stored.
    ItemNotFound(ItemId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted row cannot be converted into the model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NoteAlreadyExists(id) => write!(f, "note already exists: {id}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "outline repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid outline data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Stored shape of a note. Items are stored as separate rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: NoteId,
    pub title: String,
    /// Unix epoch milliseconds.
    pub date: i64,
}

impl From<&Note> for NoteRecord {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title.clone(),
            date: note.date,
        }
    }
}

/// Mutable note fields written by a note patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: String,
}

/// Mutable item fields written by an item patch.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemChanges {
    pub title: String,
    pub level: u32,
    pub position: f64,
    pub done: Option<bool>,
    pub collapsed: Vec<Item>,
}

impl From<&Item> for ItemChanges {
    fn from(item: &Item) -> Self {
        Self {
            title: item.title.clone(),
            level: item.level,
            position: item.position,
            done: item.done,
            collapsed: item.collapsed.clone(),
        }
    }
}

/// Persistence contract consumed by the outline store.
pub trait OutlineRepository {
    /// Loads all notes sorted by ascending `date`.
    fn load_notes(&self) -> RepoResult<Vec<NoteRecord>>;
    /// Loads one note's items sorted by ascending `position`.
    fn load_items(&self, note_id: &str) -> RepoResult<Vec<Item>>;
    /// Inserts a note row. Fails with `NoteAlreadyExists` on id collision.
    fn add_note(&self, note: &NoteRecord) -> RepoResult<()>;
    /// Overwrites the mutable fields of one note row.
    fn patch_note(&self, note_id: &str, changes: &NoteChanges) -> RepoResult<()>;
    /// Deletes one note row. Missing rows are ignored.
    fn delete_note(&self, note_id: &str) -> RepoResult<()>;
    /// Inserts one item row.
    fn add_item(&self, item: &Item) -> RepoResult<()>;
    /// Overwrites the mutable fields of one item row.
    fn patch_item(&self, item_id: &str, changes: &ItemChanges) -> RepoResult<()>;
    /// Deletes one item row. Missing rows are ignored.
    fn delete_item(&self, item_id: &str) -> RepoResult<()>;
    /// Deletes every item row owned by `note_id`. Returns the row count.
    fn delete_items_of_note(&self, note_id: &str) -> RepoResult<usize>;
}

/// SQLite-backed outline repository.
pub struct SqliteOutlineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOutlineRepository<'conn> {
    /// Creates a repository over a fully migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl OutlineRepository for SqliteOutlineRepository<'_> {
    fn load_notes(&self) -> RepoResult<Vec<NoteRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, date
             FROM notes
             ORDER BY date ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(NoteRecord {
                id: row.get("id")?,
                title: row.get("title")?,
                date: row.get("date")?,
            });
        }
        Ok(notes)
    }

    fn load_items(&self, note_id: &str) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE note_id = ?1
             ORDER BY position ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([note_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn add_note(&self, note: &NoteRecord) -> RepoResult<()> {
        let result = self.conn.execute(
            "INSERT INTO notes (id, title, date) VALUES (?1, ?2, ?3);",
            params![note.id, note.title, note.date],
        );
        match result {
            Ok(_) => Ok(()),
            Err(err) if is_constraint_violation(&err) => {
                Err(RepoError::NoteAlreadyExists(note.id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn patch_note(&self, note_id: &str, changes: &NoteChanges) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes SET title = ?2 WHERE id = ?1;",
            params![note_id, changes.title],
        )?;
        if changed == 0 {
            return Err(RepoError::NoteNotFound(note_id.to_string()));
        }
        Ok(())
    }

    fn delete_note(&self, note_id: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM notes WHERE id = ?1;", [note_id])?;
        Ok(())
    }

    fn add_item(&self, item: &Item) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO items (
                id,
                note_id,
                title,
                level,
                position,
                done,
                collapsed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                item.id,
                item.note_id,
                item.title,
                i64::from(item.level),
                item.position,
                item.done,
                encode_collapsed(&item.collapsed)?,
            ],
        )?;
        Ok(())
    }

    fn patch_item(&self, item_id: &str, changes: &ItemChanges) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET
                title = ?2,
                level = ?3,
                position = ?4,
                done = ?5,
                collapsed = ?6
             WHERE id = ?1;",
            params![
                item_id,
                changes.title,
                i64::from(changes.level),
                changes.position,
                changes.done,
                encode_collapsed(&changes.collapsed)?,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(item_id.to_string()));
        }
        Ok(())
    }

    fn delete_item(&self, item_id: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM items WHERE id = ?1;", [item_id])?;
        Ok(())
    }

    fn delete_items_of_note(&self, note_id: &str) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM items WHERE note_id = ?1;", [note_id])?;
        Ok(removed)
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id: String = row.get("id")?;

    let level_value: i64 = row.get("level")?;
    let level = u32::try_from(level_value).map_err(|_| {
        RepoError::InvalidData(format!("invalid level `{level_value}` in items.level"))
    })?;

    let done = match row.get::<_, Option<i64>>("done")? {
        None => None,
        Some(0) => Some(false),
        Some(1) => Some(true),
        Some(other) => {
            return Err(RepoError::InvalidData(format!(
                "invalid done value `{other}` in items.done"
            )));
        }
    };

    let collapsed_text: String = row.get("collapsed")?;
    let collapsed = serde_json::from_str::<Vec<Item>>(&collapsed_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid collapsed payload for item `{id}`: {err}"))
    })?;

    Ok(Item {
        note_id: row.get("note_id")?,
        title: row.get("title")?,
        level,
        position: row.get("position")?,
        done,
        collapsed,
        id,
    })
}

fn encode_collapsed(collapsed: &[Item]) -> RepoResult<String> {
    serde_json::to_string(collapsed)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode collapsed items: {err}")))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}
