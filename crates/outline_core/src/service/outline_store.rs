//! Outline store: the observable note collection and its mutation API.
//!
//! # Responsibility
//! - Own the session's notes, newest first, and publish every change.
//! - Turn model edits into repository writes: row inserts immediately,
//!   patches and deletes through the debounced write queue.
//! - Prune blank items and empty notes while loading.
//!
//! # Invariants
//! - Observers see a mutation before any write for it is scheduled.
//! - A missing note id is a no-op, logged at debug level.
//! - Repository failures during mutations are logged and never retried;
//!   the in-memory collection stays authoritative.

use crate::config::EngineConfig;
use crate::model::id::{new_id, ItemId, NoteId};
use crate::model::item::Item;
use crate::model::note::{Note, DEFAULT_NOTE_TITLE};
use crate::model::ordering::OrderingScheme;
use crate::persist::write_op::WriteOp;
use crate::persist::write_queue::WriteQueue;
use crate::repo::outline_repo::{
    ItemChanges, NoteChanges, NoteRecord, OutlineRepository, RepoError, RepoResult,
};
use crate::service::clock::{Clock, SystemClock};
use crate::service::observers::{ObserverRegistry, SubscriptionId};
use log::{debug, info, warn};
use std::time::Instant;

/// Outcome counts of one write-queue flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Writes the repository accepted.
    pub applied: usize,
    /// Patches whose target row no longer exists.
    pub skipped: usize,
    /// Writes the repository rejected.
    pub failed: usize,
}

impl FlushReport {
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failed
    }
}

/// Session-scoped outline engine over one repository.
///
/// Dropping the store flushes any writes still queued.
pub struct OutlineStore<R: OutlineRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    ordering: OrderingScheme,
    notes: Vec<Note>,
    queue: WriteQueue<WriteOp>,
    observers: ObserverRegistry,
}

impl<R: OutlineRepository> OutlineStore<R> {
    /// Loads all notes from `repo` using the system clock.
    pub fn load(repo: R, config: &EngineConfig) -> RepoResult<Self> {
        Self::load_with_clock(repo, config, SystemClock)
    }
}

impl<R: OutlineRepository, C: Clock> OutlineStore<R, C> {
    /// Loads all notes from `repo`.
    ///
    /// Blank items are dropped and their rows deleted. Notes left empty
    /// afterwards are deleted and excluded. A note whose items cannot be
    /// read is skipped and its rows are left alone. Stored positions that
    /// do not strictly increase are renumbered and the moved rows queued
    /// for a patch. Only a failure to list the notes aborts the load.
    pub fn load_with_clock(repo: R, config: &EngineConfig, clock: C) -> RepoResult<Self> {
        let ordering = config.ordering();
        let records = repo.load_notes()?;
        let mut notes = Vec::with_capacity(records.len());
        let mut repaired = Vec::new();
        let mut pruned_items = 0usize;
        let mut pruned_notes = 0usize;
        let mut unreadable_notes = 0usize;

        for record in records {
            let loaded = match repo.load_items(&record.id) {
                Ok(items) => items,
                Err(err) => {
                    warn!(
                        "event=outline_load module=service status=error note_id={} error={err}",
                        record.id
                    );
                    unreadable_notes += 1;
                    continue;
                }
            };
            let (items, blank): (Vec<Item>, Vec<Item>) =
                loaded.into_iter().partition(|item| !item.is_blank());

            for item in &blank {
                log_write_result("delete_item", &item.id, repo.delete_item(&item.id));
            }
            pruned_items += blank.len();

            let mut note = Note {
                id: record.id,
                title: record.title,
                date: record.date,
                items,
            };
            if note.is_empty() {
                log_write_result("delete_note", &note.id, repo.delete_note(&note.id));
                pruned_notes += 1;
                continue;
            }
            repaired.extend(note.repair_positions(&ordering));
            notes.push(note);
        }
        notes.reverse();

        info!(
            "event=outline_load module=service status=ok notes={} pruned_notes={} pruned_items={} unreadable_notes={} repaired_items={}",
            notes.len(),
            pruned_notes,
            pruned_items,
            unreadable_notes,
            repaired.len()
        );

        let mut store = Self {
            repo,
            clock,
            ordering,
            notes,
            queue: WriteQueue::new(config.write_delay()),
            observers: ObserverRegistry::new(),
        };
        store.schedule_item_patches(&repaired);
        Ok(store)
    }

    /// Current collection, newest note first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Registers `observer` and immediately calls it with the current
    /// collection.
    pub fn subscribe(&mut self, mut observer: impl FnMut(&[Note]) + 'static) -> SubscriptionId {
        observer(&self.notes);
        self.observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Creates an empty note, with `note_id` or a fresh id.
    ///
    /// The row is written immediately. An id already present in memory or
    /// in the repository leaves the collection unchanged and returns `None`.
    pub fn add_note(&mut self, note_id: Option<&str>) -> Option<NoteId> {
        let id = note_id.map_or_else(new_id, str::to_string);
        if self.note_index(&id).is_some() {
            warn!("event=note_add module=service status=skip reason=already_exists note_id={id}");
            return None;
        }

        let note = Note::new(id, DEFAULT_NOTE_TITLE, self.clock.epoch_millis());
        match self.repo.add_note(&NoteRecord::from(&note)) {
            Ok(()) => {}
            Err(RepoError::NoteAlreadyExists(id)) => {
                warn!("event=note_add module=service status=skip reason=already_exists note_id={id}");
                return None;
            }
            Err(err) => log_write_failed("add_note", &note.id, &err),
        }

        info!("event=note_add module=service status=ok note_id={}", note.id);
        let id = note.id.clone();
        self.notes.insert(0, note);
        self.publish();
        Some(id)
    }

    /// Removes a note and schedules deletion of its row and item rows.
    pub fn remove_note(&mut self, note_id: &str) {
        let Some(n) = self.find_note("remove_note", note_id) else {
            return;
        };
        let note = self.notes.remove(n);
        self.publish();
        info!(
            "event=note_remove module=service status=ok note_id={} items={}",
            note.id,
            note.items.len()
        );
        self.schedule(WriteOp::DeleteNote { note_id: note.id });
    }

    /// Inserts an empty item at `index` and writes its row.
    ///
    /// Returns the new item id.
    pub fn add_item_to_note(&mut self, note_id: &str, index: usize) -> Option<ItemId> {
        let n = self.find_note("add_item", note_id)?;
        let Some(insert) = self.notes[n].add_item(index, &self.ordering) else {
            debug!("event=not_found module=service op=add_item note_id={note_id} index={index}");
            return None;
        };
        self.publish();

        log_write_result("add_item", &insert.item.id, self.repo.add_item(&insert.item));
        self.schedule_item_patches(&insert.renumbered);
        Some(insert.item.id)
    }

    /// Removes the item at `index` and schedules deletion of its row.
    pub fn remove_item_from_note(&mut self, note_id: &str, index: usize) {
        let Some(n) = self.find_note("remove_item", note_id) else {
            return;
        };
        let Some(removed) = self.notes[n].remove_item(index) else {
            debug!("event=not_found module=service op=remove_item note_id={note_id} index={index}");
            return;
        };
        self.publish();
        self.schedule(WriteOp::DeleteItem {
            item_id: removed.id,
        });
    }

    /// Applies an in-place edit to one item and publishes it.
    ///
    /// Nothing is persisted; follow up with `save_item_changes`.
    pub fn edit_item(&mut self, note_id: &str, index: usize, edit: impl FnOnce(&mut Item)) -> bool {
        let Some(n) = self.find_note("edit_item", note_id) else {
            return false;
        };
        let Some(item) = self.notes[n].items.get_mut(index) else {
            return false;
        };
        edit(item);
        self.publish();
        true
    }

    /// Replaces a note title in memory and publishes it.
    ///
    /// Nothing is persisted; follow up with `save_note_changes`.
    pub fn set_note_title(&mut self, note_id: &str, title: impl Into<String>) -> bool {
        let Some(n) = self.find_note("set_note_title", note_id) else {
            return false;
        };
        self.notes[n].title = title.into();
        self.publish();
        true
    }

    /// Schedules a write of the item's current title, level, position,
    /// done flag and collapsed buffer.
    pub fn save_item_changes(&mut self, note_id: &str, index: usize) {
        let Some(n) = self.find_note("save_item", note_id) else {
            return;
        };
        let Some(item) = self.notes[n].items.get(index) else {
            debug!("event=not_found module=service op=save_item note_id={note_id} index={index}");
            return;
        };
        let op = WriteOp::PatchItem {
            item_id: item.id.clone(),
            changes: ItemChanges::from(item),
        };
        self.schedule(op);
    }

    /// Schedules a write of the note's current title.
    pub fn save_note_changes(&mut self, note_id: &str) {
        let Some(n) = self.find_note("save_note", note_id) else {
            return;
        };
        let note = &self.notes[n];
        let op = WriteOp::PatchNote {
            note_id: note.id.clone(),
            changes: NoteChanges {
                title: note.title.clone(),
            },
        };
        self.schedule(op);
    }

    /// Swaps the item at `index` with the one above it.
    pub fn move_item_up_in_note(&mut self, note_id: &str, index: usize) {
        let Some(n) = self.find_note("move_item_up", note_id) else {
            return;
        };
        if let Some((a, b)) = self.notes[n].move_item_up(index) {
            self.after_swap(n, a, b);
        }
    }

    /// Swaps the item at `index` with the one below it.
    pub fn move_item_down_in_note(&mut self, note_id: &str, index: usize) {
        let Some(n) = self.find_note("move_item_down", note_id) else {
            return;
        };
        if let Some((a, b)) = self.notes[n].move_item_down(index) {
            self.after_swap(n, a, b);
        }
    }

    /// Nests the item one level deeper under the item above it.
    ///
    /// Refused when the item above is shallower than this item.
    pub fn indent_item(&mut self, note_id: &str, index: usize) -> bool {
        let Some(n) = self.find_note("indent_item", note_id) else {
            return false;
        };
        let items = &mut self.notes[n].items;
        if index == 0 || index >= items.len() || items[index - 1].level < items[index].level {
            return false;
        }
        items[index].level += 1;
        self.publish();
        self.save_item_changes(note_id, index);
        true
    }

    /// Moves the item one level shallower.
    pub fn outdent_item(&mut self, note_id: &str, index: usize) -> bool {
        let Some(n) = self.find_note("outdent_item", note_id) else {
            return false;
        };
        let Some(item) = self.notes[n].items.get_mut(index) else {
            return false;
        };
        if item.level == 0 {
            return false;
        }
        item.level -= 1;
        self.publish();
        self.save_item_changes(note_id, index);
        true
    }

    /// Hides the subtree below `index` and schedules deletion of its rows.
    pub fn collapse_items_in_note(&mut self, note_id: &str, index: usize) {
        let Some(n) = self.find_note("collapse", note_id) else {
            return;
        };
        let Some(removed) = self.notes[n].collapse(index) else {
            debug!("event=not_found module=service op=collapse note_id={note_id} index={index}");
            return;
        };
        self.publish();

        for child in removed {
            self.schedule(WriteOp::DeleteItem { item_id: child.id });
        }
        self.save_item_changes(note_id, index);
    }

    /// Restores the subtree hidden under `index` as new rows.
    pub fn expand_items_in_note(&mut self, note_id: &str, index: usize) {
        let Some(n) = self.find_note("expand", note_id) else {
            return;
        };
        let Some(expansion) = self.notes[n].expand(index, &self.ordering) else {
            debug!("event=not_found module=service op=expand note_id={note_id} index={index}");
            return;
        };
        self.publish();

        for item in &expansion.inserted {
            log_write_result("add_item", &item.id, self.repo.add_item(item));
        }
        self.schedule_item_patches(&expansion.renumbered);
        self.save_item_changes(note_id, index);
    }

    /// Runs queued writes if the quiet period has elapsed.
    pub fn tick(&mut self) -> FlushReport {
        let batch = self.queue.take_due(self.clock.now());
        self.run_batch(batch)
    }

    /// Runs every queued write now, ignoring the quiet period.
    pub fn flush_pending(&mut self) -> FlushReport {
        let batch = self.queue.take_all();
        self.run_batch(batch)
    }

    /// Queued writes in flush order.
    pub fn pending_writes(&self) -> impl Iterator<Item = &WriteOp> {
        self.queue.iter().map(|(_, op)| op)
    }

    /// When the queued writes become due, if any are queued.
    pub fn next_flush_at(&self) -> Option<Instant> {
        self.queue.deadline()
    }

    fn after_swap(&mut self, n: usize, a: usize, b: usize) {
        self.publish();
        let swapped = [self.notes[n].items[a].clone(), self.notes[n].items[b].clone()];
        self.schedule_item_patches(&swapped);
    }

    fn schedule_item_patches(&mut self, items: &[Item]) {
        for item in items {
            self.schedule(WriteOp::PatchItem {
                item_id: item.id.clone(),
                changes: ItemChanges::from(item),
            });
        }
    }

    fn schedule(&mut self, op: WriteOp) {
        let key = op.key();
        let name = op.name();
        let replaced = self.queue.schedule(key.as_str(), op, self.clock.now());
        debug!(
            "event=write_scheduled module=persist op={name} key={key} replaced={replaced} pending={}",
            self.queue.len()
        );
    }

    fn run_batch(&mut self, batch: Vec<(String, WriteOp)>) -> FlushReport {
        let mut report = FlushReport::default();
        if batch.is_empty() {
            return report;
        }

        for (key, op) in &batch {
            match op.apply(&self.repo) {
                Ok(()) => report.applied += 1,
                Err(RepoError::NoteNotFound(_) | RepoError::ItemNotFound(_)) => {
                    debug!(
                        "event=write_flush module=persist status=skip op={} key={key} reason=row_missing",
                        op.name()
                    );
                    report.skipped += 1;
                }
                Err(err) => {
                    log_write_failed(op.name(), key, &err);
                    report.failed += 1;
                }
            }
        }

        info!(
            "event=write_flush module=persist status=ok applied={} skipped={} failed={}",
            report.applied, report.skipped, report.failed
        );
        report
    }

    fn publish(&mut self) {
        self.observers.notify(&self.notes);
    }

    fn note_index(&self, note_id: &str) -> Option<usize> {
        self.notes.iter().position(|note| note.id == note_id)
    }

    fn find_note(&self, op: &str, note_id: &str) -> Option<usize> {
        let found = self.note_index(note_id);
        if found.is_none() {
            debug!("event=not_found module=service op={op} note_id={note_id}");
        }
        found
    }
}

impl<R: OutlineRepository, C: Clock> Drop for OutlineStore<R, C> {
    /// Session end: queued writes run now instead of being lost.
    fn drop(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let report = self.flush_pending();
        info!(
            "event=session_end module=persist status=ok applied={} skipped={} failed={}",
            report.applied, report.skipped, report.failed
        );
    }
}

fn log_write_result(op: &str, target: &str, result: RepoResult<()>) {
    if let Err(err) = result {
        log_write_failed(op, target, &err);
    }
}

fn log_write_failed(op: &str, target: &str, err: &RepoError) {
    warn!("event=write_failed module=persist status=error op={op} target={target} error={err}");
}
