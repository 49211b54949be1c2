//! SQLite storage for notes and items.
//!
//! Connections handed out here are migrated to the latest schema; nothing
//! else in the crate opens SQLite directly.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, DbError, DbResult};
