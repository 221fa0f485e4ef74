//! Candidate queue: rectangles ordered by a caller-chosen cost.
//!
//! The queue is min-first: the entry with the lowest cost is popped first,
//! ties broken by insertion order. Engines that want a max-first discipline
//! (largest volume, longest shortest edge) push the *negated* quantity as
//! the cost. This is the only place that convention is defined; every engine
//! in the crate follows it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::rectangle::Rectangle;

/// Lexicographic (cost, id) ordering key.
///
/// Uses `total_cmp` so NaN costs still order deterministically.
#[derive(Debug, Clone, Copy)]
struct QueueKey {
    cost: f64,
    /// Insertion counter; makes every entry unique.
    id: usize,
}

impl PartialEq for QueueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueKey {}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Priority queue of candidate rectangles.
#[derive(Debug, Clone, Default)]
pub struct CandidateQueue {
    entries: BTreeMap<QueueKey, Rectangle>,
    next_id: usize,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cost: f64, rect: Rectangle) {
        let key = QueueKey {
            cost,
            id: self.next_id,
        };
        self.next_id += 1;
        self.entries.insert(key, rect);
    }

    /// Remove and return the lowest-cost entry.
    pub fn pop(&mut self) -> Option<(f64, Rectangle)> {
        self.entries.pop_first().map(|(k, r)| (k.cost, r))
    }

    pub fn peek(&self) -> Option<(f64, &Rectangle)> {
        self.entries.first_key_value().map(|(k, r)| (k.cost, r))
    }

    pub fn peek_cost(&self) -> Option<f64> {
        self.peek().map(|(c, _)| c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in pop order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &Rectangle)> + '_ {
        self.entries.iter().map(|(k, r)| (k.cost, r))
    }

    /// Clone of every queued rectangle, in pop order.
    pub fn rectangles(&self) -> Vec<Rectangle> {
        self.entries.values().cloned().collect()
    }

    /// Sum of the volumes of all queued rectangles.
    pub fn total_volume(&self) -> f64 {
        self.entries.values().map(Rectangle::volume).sum()
    }
}

impl Extend<(f64, Rectangle)> for CandidateQueue {
    fn extend<I: IntoIterator<Item = (f64, Rectangle)>>(&mut self, iter: I) {
        for (cost, rect) in iter {
            self.push(cost, rect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(side: f64) -> Rectangle {
        Rectangle::new(vec![0.0, 0.0], vec![side, side]).unwrap()
    }

    #[test]
    fn test_min_first_order() {
        let mut q = CandidateQueue::new();
        q.push(3.0, rect(3.0));
        q.push(1.0, rect(1.0));
        q.push(2.0, rect(2.0));
        assert_eq!(q.peek_cost(), Some(1.0));
        let costs: Vec<f64> = std::iter::from_fn(|| q.pop().map(|(c, _)| c)).collect();
        assert_eq!(costs, vec![1.0, 2.0, 3.0]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_negated_volume_is_max_first() {
        let mut q = CandidateQueue::new();
        for side in [0.5, 2.0, 1.0] {
            let r = rect(side);
            q.push(-r.volume(), r);
        }
        let (_, first) = q.pop().unwrap();
        assert_eq!(first, rect(2.0));
    }

    #[test]
    fn test_equal_entries_coexist_in_insertion_order() {
        let mut q = CandidateQueue::new();
        q.push(1.0, rect(1.0));
        q.push(1.0, rect(1.0).with_error(0.25));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().unwrap().1.error(), 0.0);
        assert_eq!(q.pop().unwrap().1.error(), 0.25);
    }

    #[test]
    fn test_total_volume_and_extend() {
        let mut q = CandidateQueue::new();
        q.extend(vec![(0.0, rect(1.0)), (0.0, rect(2.0))]);
        assert_eq!(q.total_volume(), 5.0);
        assert_eq!(q.rectangles().len(), 2);
        assert_eq!(q.iter().count(), 2);
    }
}
