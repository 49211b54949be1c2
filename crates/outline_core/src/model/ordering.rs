//! Position assignment for items in a note's flattened sequence.
//!
//! # Responsibility
//! - Pick a position for an insertion index that keeps the sequence sorted.
//! - Renumber the sequence when two neighbours leave no integral gap.
//!
//! # Invariants
//! - Positions produced here are whole numbers.
//! - After `rebalance`, positions are `base, base + step, ...` in sequence
//!   order.

use super::item::Item;

pub const DEFAULT_POSITION_BASE: f64 = 1000.0;
pub const DEFAULT_POSITION_STEP: f64 = 1000.0;
/// Smallest base and step for which a rounded midpoint always fits after
/// a rebalance.
pub const MIN_POSITION_GAP: f64 = 2.0;

/// Midpoint ordering with an append gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderingScheme {
    base: f64,
    step: f64,
}

impl Default for OrderingScheme {
    fn default() -> Self {
        Self::new(DEFAULT_POSITION_BASE, DEFAULT_POSITION_STEP)
    }
}

impl OrderingScheme {
    /// Values below [`MIN_POSITION_GAP`] are raised to it.
    pub fn new(base: f64, step: f64) -> Self {
        Self {
            base: base.max(MIN_POSITION_GAP),
            step: step.max(MIN_POSITION_GAP),
        }
    }

    /// Returns the position for a new item inserted at `index`.
    ///
    /// - empty sequence: `base`
    /// - at the end: `last + step`
    /// - otherwise: rounded midpoint of the neighbours; the front uses `0`
    ///   as its virtual previous neighbour.
    ///
    /// The value may collide with a neighbour when the gap is exhausted;
    /// check [`OrderingScheme::has_room`] first.
    pub fn position_for(&self, items: &[Item], index: usize) -> f64 {
        if items.is_empty() {
            return self.base;
        }
        if index >= items.len() {
            return items[items.len() - 1].position + self.step;
        }
        let previous = if index == 0 {
            0.0
        } else {
            items[index - 1].position
        };
        ((previous + items[index].position) / 2.0).round()
    }

    /// Returns whether `position_for(items, index)` lands strictly between
    /// its neighbours.
    pub fn has_room(&self, items: &[Item], index: usize) -> bool {
        if index >= items.len() {
            return true;
        }
        let candidate = self.position_for(items, index);
        let above_previous = index == 0 || candidate > items[index - 1].position;
        above_previous && candidate < items[index].position
    }

    /// Renumbers `items` in place and returns the indices whose position
    /// changed.
    pub fn rebalance(&self, items: &mut [Item]) -> Vec<usize> {
        let mut changed = Vec::new();
        for (index, item) in items.iter_mut().enumerate() {
            let position = self.base + self.step * index as f64;
            if item.position != position {
                item.position = position;
                changed.push(index);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::OrderingScheme;
    use crate::model::item::Item;

    fn items(positions: &[f64]) -> Vec<Item> {
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| Item::new(format!("i{i}"), "n".into(), 0, *p))
            .collect()
    }

    #[test]
    fn empty_sequence_starts_at_base() {
        assert_eq!(OrderingScheme::default().position_for(&[], 0), 1000.0);
    }

    #[test]
    fn append_adds_step() {
        let seq = items(&[1000.0, 2000.0]);
        assert_eq!(OrderingScheme::default().position_for(&seq, 2), 3000.0);
    }

    #[test]
    fn insert_between_uses_rounded_midpoint() {
        let seq = items(&[1000.0, 1003.0]);
        let scheme = OrderingScheme::default();
        assert_eq!(scheme.position_for(&seq, 1), 1002.0);
        assert!(scheme.has_room(&seq, 1));
    }

    #[test]
    fn front_insert_halves_first_position() {
        let seq = items(&[1000.0]);
        assert_eq!(OrderingScheme::default().position_for(&seq, 0), 500.0);
    }

    #[test]
    fn adjacent_integers_have_no_room() {
        let scheme = OrderingScheme::default();
        assert!(!scheme.has_room(&items(&[1000.0, 1001.0]), 1));
        assert!(!scheme.has_room(&items(&[1.0, 5.0]), 0));
    }

    #[test]
    fn tiny_gaps_are_raised_so_front_inserts_fit_after_rebalance() {
        let scheme = OrderingScheme::new(1.0, 0.5);
        let mut seq = items(&[1.0, 2.0]);
        assert!(!scheme.has_room(&seq, 0));

        scheme.rebalance(&mut seq);
        assert!(scheme.has_room(&seq, 0));
        assert!(scheme.has_room(&seq, 1));
    }

    #[test]
    fn rebalance_reports_only_moved_rows() {
        let mut seq = items(&[1000.0, 1001.0, 1002.0]);
        let changed = OrderingScheme::default().rebalance(&mut seq);
        assert_eq!(changed, vec![1, 2]);
        let positions: Vec<f64> = seq.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![1000.0, 2000.0, 3000.0]);
    }
}
