//! Outline orchestration.
//!
//! # Responsibility
//! - Expose the only mutation surface the view layer uses.
//! - Sequence every mutation as: model edit, observer publish, persistence.
//!
//! # Invariants
//! - Unknown note ids are silent no-ops; nothing here returns errors for
//!   mutations.

pub mod clock;
pub mod observers;
pub mod outline_store;
