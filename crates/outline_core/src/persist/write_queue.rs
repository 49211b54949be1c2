//! Keyed write queue with a shared quiet-period deadline.
//!
//! The queue owns no timer. Hosts drive it with their event loop: every
//! `schedule` pushes the deadline to `now + delay`, and `take_due(now)`
//! hands back the whole batch once that deadline has passed.

use std::time::{Duration, Instant};

/// Pending writes keyed by entity.
#[derive(Debug)]
pub struct WriteQueue<T> {
    delay: Duration,
    pending: Vec<(String, T)>,
    deadline: Option<Instant>,
}

impl<T> WriteQueue<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Vec::new(),
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Queues `op` under `key` and re-arms the deadline.
    ///
    /// A pending op with the same key is replaced in place, keeping its
    /// slot in flush order. Returns `true` when an op was replaced.
    pub fn schedule(&mut self, key: impl Into<String>, op: T, now: Instant) -> bool {
        let key = key.into();
        self.deadline = Some(now + self.delay);
        match self.pending.iter_mut().find(|(pending, _)| *pending == key) {
            Some((_, slot)) => {
                *slot = op;
                true
            }
            None => {
                self.pending.push((key, op));
                false
            }
        }
    }

    /// Returns when the current batch becomes due, if anything is queued.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Removes and returns the batch in schedule order if it is due.
    pub fn take_due(&mut self, now: Instant) -> Vec<(String, T)> {
        if !self.is_due(now) {
            return Vec::new();
        }
        self.take_all()
    }

    /// Removes and returns the batch regardless of the deadline.
    pub fn take_all(&mut self) -> Vec<(String, T)> {
        self.deadline = None;
        std::mem::take(&mut self.pending)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.pending
            .iter()
            .find(|(pending, _)| pending == key)
            .map(|(_, op)| op)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.pending.iter().map(|(key, op)| (key.as_str(), op))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::WriteQueue;
    use std::time::{Duration, Instant};

    const DELAY: Duration = Duration::from_millis(2000);

    #[test]
    fn nothing_is_due_before_the_quiet_period() {
        let start = Instant::now();
        let mut queue = WriteQueue::new(DELAY);
        queue.schedule("a", 1, start);

        assert!(queue.take_due(start + Duration::from_millis(1999)).is_empty());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.take_due(start + DELAY), vec![("a".to_string(), 1)]);
        assert!(queue.is_empty());
        assert_eq!(queue.deadline(), None);
    }

    #[test]
    fn same_key_keeps_last_payload() {
        let start = Instant::now();
        let mut queue = WriteQueue::new(DELAY);
        assert!(!queue.schedule("a", "first", start));
        assert!(queue.schedule("a", "second", start));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get("a"), Some(&"second"));
    }

    #[test]
    fn every_schedule_rearms_the_shared_deadline() {
        let start = Instant::now();
        let mut queue = WriteQueue::new(DELAY);
        queue.schedule("a", 1, start);
        queue.schedule("b", 2, start + Duration::from_millis(1500));

        assert!(!queue.is_due(start + DELAY));
        let batch = queue.take_due(start + Duration::from_millis(3500));
        assert_eq!(batch, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    #[test]
    fn replaced_key_keeps_its_original_slot() {
        let start = Instant::now();
        let mut queue = WriteQueue::new(DELAY);
        queue.schedule("a", 1, start);
        queue.schedule("b", 2, start);
        queue.schedule("a", 3, start);

        let keys: Vec<&str> = queue.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(queue.take_all(), vec![("a".to_string(), 3), ("b".to_string(), 2)]);
    }

    #[test]
    fn empty_queue_is_never_due() {
        let queue: WriteQueue<u8> = WriteQueue::new(DELAY);
        assert!(!queue.is_due(Instant::now() + DELAY * 10));
    }
}
