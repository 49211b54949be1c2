//! Outline engine: notes as collapsible item trees with debounced
//! write-back to a local store.
//!
//! The view layer talks to [`OutlineStore`] only. Everything else is
//! exposed for hosts that bring their own repository or drive the model
//! directly.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod repo;
pub mod service;

pub use config::EngineConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::id::{new_id, ItemId, NoteId};
pub use model::item::Item;
pub use model::note::{Expansion, ItemInsert, Note, DEFAULT_NOTE_TITLE};
pub use model::ordering::OrderingScheme;
pub use persist::write_op::WriteOp;
pub use persist::write_queue::WriteQueue;
pub use repo::outline_repo::{
    ItemChanges, NoteChanges, NoteRecord, OutlineRepository, RepoError, RepoResult,
    SqliteOutlineRepository,
};
pub use service::clock::{Clock, SystemClock};
pub use service::observers::SubscriptionId;
pub use service::outline_store::{FlushReport, OutlineStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
