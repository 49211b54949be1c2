//! Subscriber registry for note collection snapshots.

use crate::model::note::Note;
use std::collections::BTreeMap;

/// Callback receiving the full note collection after every mutation.
pub type Observer = Box<dyn FnMut(&[Note])>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Ordered set of observers; notified in subscription order.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: BTreeMap<SubscriptionId, Observer>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.insert(id, observer);
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub fn notify(&mut self, notes: &[Note]) {
        for observer in self.observers.values_mut() {
            observer(notes);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
