//! Store contract for notes and items, and its SQLite implementation.
//!
//! # Responsibility
//! - Define the narrow persistence contract the outline store writes through.
//! - Keep SQL details out of the model and the orchestrator.
//!
//! # Invariants
//! - Notes load in ascending `date`, items in ascending `position`.
//! - Adding a note whose id exists fails with `NoteAlreadyExists`.
//! - Deletes are idempotent; patches report missing rows as not-found.

pub mod outline_repo;
