//! In-memory outline model.
//!
//! # Responsibility
//! - Define notes and items and the structural edits on a note's item list.
//! - Own the ordering scheme that keeps item positions sortable.
//!
//! # Invariants
//! - A note's items form a flat, level-tagged sequence; subtrees are index
//!   ranges, never parent pointers.
//! - `position` strictly increases along the sequence.
//! - Model operations never touch storage; callers persist what they return.

pub mod id;
pub mod item;
pub mod note;
pub mod ordering;
