//! Debounced write-back from the in-memory outline to the repository.
//!
//! # Responsibility
//! - Coalesce bursts of mutations into one write per entity.
//! - Carry snapshot payloads so a flush never reads live model state.
//!
//! # Invariants
//! - At most one pending write per key; a later schedule replaces it.
//! - One shared deadline, re-armed by every schedule.

pub mod write_op;
pub mod write_queue;
