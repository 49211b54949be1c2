//! Note document and the structural edits on its item sequence.
//!
//! # Responsibility
//! - Insert, remove, reorder, collapse and expand items.
//! - Report every row a structural edit creates or renumbers, so the
//!   orchestrator can persist exactly those rows.
//!
//! # Invariants
//! - `items` is sorted by strictly increasing `position`.
//! - The subtree of `items[i]` is the maximal run of following items whose
//!   level exceeds `items[i].level`.
//! - Out-of-range indices leave the note untouched and return `None`.

use super::id::{new_id, ItemId, NoteId};
use super::item::Item;
use super::ordering::OrderingScheme;
use std::collections::BTreeSet;
use std::ops::Range;

/// Title given to new notes. A note still carrying it with no items is
/// considered empty.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled";

/// An outline document.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Creation time in Unix epoch milliseconds. Never changes.
    pub date: i64,
    pub items: Vec<Item>,
}

/// Result of inserting one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemInsert {
    /// The inserted item.
    pub item: Item,
    /// Pre-existing items whose position was rewritten to make room.
    pub renumbered: Vec<Item>,
}

/// Result of expanding a collapsed item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expansion {
    /// Re-created live rows, in sequence order, each with a fresh id.
    pub inserted: Vec<Item>,
    /// Pre-existing items whose position was rewritten to make room.
    pub renumbered: Vec<Item>,
}

impl Note {
    pub fn new(id: impl Into<NoteId>, title: impl Into<String>, date: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date,
            items: Vec::new(),
        }
    }

    /// Returns whether this note has nothing worth keeping: a blank or
    /// placeholder title and no items.
    pub fn is_empty(&self) -> bool {
        let title = self.title.trim();
        (title.is_empty() || title == DEFAULT_NOTE_TITLE) && self.items.is_empty()
    }

    /// Inserts an untitled item at `index` (`0..=len`).
    ///
    /// The level is copied from the item before `index`, or 0 at the front.
    pub fn add_item(&mut self, index: usize, ordering: &OrderingScheme) -> Option<ItemInsert> {
        if index > self.items.len() {
            return None;
        }

        let level = match index {
            0 => 0,
            _ => self.items[index - 1].level,
        };
        let renumbered = self.make_room(index, ordering);
        let position = ordering.position_for(&self.items, index);
        let item = Item::new(new_id(), self.id.clone(), level, position);
        self.items.insert(index, item.clone());

        Some(ItemInsert {
            item,
            renumbered: self.snapshot(&renumbered),
        })
    }

    /// Removes the item at `index`. Its visible children stay at their
    /// current levels.
    pub fn remove_item(&mut self, index: usize) -> Option<Item> {
        if index >= self.items.len() {
            return None;
        }
        Some(self.items.remove(index))
    }

    /// Swaps the items at `i` and `j` while each slot keeps its position,
    /// so the sequence stays sorted.
    pub fn switch_items(&mut self, i: usize, j: usize) -> bool {
        let len = self.items.len();
        if i >= len || j >= len || i == j {
            return false;
        }
        self.items.swap(i, j);
        let position_i = self.items[i].position;
        self.items[i].position = self.items[j].position;
        self.items[j].position = position_i;
        true
    }

    /// Moves the item at `index` one slot up. Returns the swapped pair.
    pub fn move_item_up(&mut self, index: usize) -> Option<(usize, usize)> {
        if index == 0 {
            return None;
        }
        self.switch_items(index, index - 1).then_some((index, index - 1))
    }

    /// Moves the item at `index` one slot down. Returns the swapped pair.
    pub fn move_item_down(&mut self, index: usize) -> Option<(usize, usize)> {
        if index >= self.items.len() {
            return None;
        }
        self.switch_items(index, index + 1).then_some((index, index + 1))
    }

    /// Index range of the subtree below `index`. Empty when out of range.
    pub fn children_range(&self, index: usize) -> Range<usize> {
        let Some(root) = self.items.get(index) else {
            let len = self.items.len();
            return len..len;
        };
        let start = index + 1;
        let run = self.items[start..]
            .iter()
            .take_while(|item| item.level > root.level)
            .count();
        start..start + run
    }

    /// Items forming the subtree below `index`.
    pub fn children(&self, index: usize) -> &[Item] {
        &self.items[self.children_range(index)]
    }

    /// Hides the subtree below `index` inside that item's `collapsed`
    /// buffer, with levels made relative to it.
    ///
    /// Returns the rows removed from the live sequence.
    pub fn collapse(&mut self, index: usize) -> Option<Vec<Item>> {
        let root_level = self.items.get(index)?.level;
        let range = self.children_range(index);
        let mut removed: Vec<Item> = self.items.drain(range).collect();
        for child in &mut removed {
            child.level -= root_level;
        }
        self.items[index].collapsed.extend(removed.iter().cloned());
        Some(removed)
    }

    /// Re-inserts the buffered subtree of `index` right after it.
    ///
    /// Every re-inserted row gets a fresh id and an absolute level again.
    pub fn expand(&mut self, index: usize, ordering: &OrderingScheme) -> Option<Expansion> {
        let root = self.items.get_mut(index)?;
        let root_level = root.level;
        let buffered = std::mem::take(&mut root.collapsed);
        let count = buffered.len();

        let mut renumbered = BTreeSet::new();
        for (offset, mut child) in buffered.into_iter().enumerate() {
            let at = index + 1 + offset;
            renumbered.extend(self.make_room(at, ordering));
            child.id = new_id();
            child.note_id = self.id.clone();
            child.level += root_level;
            child.position = ordering.position_for(&self.items, at);
            self.items.insert(at, child);
        }

        let inserted = self.items[index + 1..index + 1 + count].to_vec();
        renumbered.retain(|id| !inserted.iter().any(|item| &item.id == id));
        let renumbered: Vec<ItemId> = renumbered.into_iter().collect();

        Some(Expansion {
            inserted,
            renumbered: self.snapshot(&renumbered),
        })
    }

    /// Renumbers the sequence when stored positions are not strictly
    /// increasing. Returns the rows whose position changed.
    pub fn repair_positions(&mut self, ordering: &OrderingScheme) -> Vec<Item> {
        let sorted = self
            .items
            .windows(2)
            .all(|pair| pair[0].position < pair[1].position);
        if sorted {
            return Vec::new();
        }
        let changed = ordering.rebalance(&mut self.items);
        changed
            .into_iter()
            .map(|index| self.items[index].clone())
            .collect()
    }

    /// Returns the index of the item with `item_id`.
    pub fn index_of(&self, item_id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == item_id)
    }

    fn make_room(&mut self, index: usize, ordering: &OrderingScheme) -> Vec<ItemId> {
        if ordering.has_room(&self.items, index) {
            return Vec::new();
        }
        ordering
            .rebalance(&mut self.items)
            .into_iter()
            .map(|changed| self.items[changed].id.clone())
            .collect()
    }

    fn snapshot(&self, ids: &[ItemId]) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect()
    }
}
