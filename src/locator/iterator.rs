use std::collections::HashMap;
use std::sync::Arc;

use super::{Member, NodeLocator};

/// Iterator over the distinct nodes of a ring, clockwise from a position
///
/// Created by [`NodeLocator::iter_from`]. Each node is yielded once, the walk stops after one
/// revolution or as soon as every node has been seen.
pub struct Clockwise<'a, N> {
    positions: &'a HashMap<u32, Arc<Member<N>>>,
    sorted: &'a [u32],
    start: usize,
    step: usize,
    seen: Vec<&'a str>,
    unseen: usize,
}

impl<'a, N> Iterator for Clockwise<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<Self::Item> {
        let positions = self.positions;
        while self.unseen > 0 && self.step < self.sorted.len() {
            let position = self.sorted[(self.start + self.step) % self.sorted.len()];
            self.step += 1;

            let member = &positions[&position];
            if !self.seen.contains(&member.key.as_str()) {
                self.seen.push(&member.key);
                self.unseen -= 1;
                return Some(&member.node);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.unseen))
    }
}

impl<N, F> NodeLocator<N, F> {
    /// Walk the ring clockwise from the position of `key`, yielding every node once.
    ///
    /// The first node is the one [`get`](NodeLocator::get) returns. An empty ring yields nothing.
    pub fn iter_from<K: AsRef<[u8]>>(&self, key: K) -> Clockwise<'_, N> {
        let hash = self.config.hash.hash_first(key.as_ref());
        self.iter_from_position(hash)
    }

    /// Walk the ring clockwise from `position`, yielding every node once.
    pub fn iter_from_position(&self, position: u32) -> Clockwise<'_, N> {
        Clockwise {
            positions: &self.positions,
            sorted: &self.sorted,
            start: self.index_of(position).unwrap_or(0),
            step: 0,
            seen: Vec::with_capacity(self.nodes.len()),
            unseen: self.nodes.len(),
        }
    }
}
