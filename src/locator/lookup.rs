use super::NodeLocator;

impl<N, F> NodeLocator<N, F> {
    /// Returns the node responsible for `key`, `None` if the ring is empty.
    ///
    /// The node owning the hash of `key` is returned if there is one, otherwise the owner of
    /// the next position clockwise.
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<&N> {
        let hash = self.config.hash.hash_first(key.as_ref());
        self.get_by_hash(hash)
    }

    /// Returns the node responsible for the ring position `hash`.
    pub fn get_by_hash(&self, hash: u32) -> Option<&N> {
        if let Some(member) = self.positions.get(&hash) {
            return Some(&member.node);
        }

        let index = self.index_of(hash)?;
        Some(&self.positions[&self.sorted[index]].node)
    }

    /// Returns the node responsible for `key` and the next distinct node clockwise.
    ///
    /// The second node is `None` if the ring holds a single node. Returns `None` if the ring
    /// is empty.
    pub fn get_two<K: AsRef<[u8]>>(&self, key: K) -> Option<(&N, Option<&N>)> {
        let mut nodes = self.iter_from(key);
        let first = nodes.next()?;

        Some((first, nodes.next()))
    }

    /// Returns up to `n` distinct nodes for `key`, starting with the node responsible for it.
    ///
    /// `n` is capped to the number of nodes on the ring. Returns an empty vec if the ring is empty.
    pub fn get_n<K: AsRef<[u8]>>(&self, key: K, n: usize) -> Vec<&N> {
        let limit = n.min(self.len());
        if limit == 0 {
            return vec![];
        }

        self.iter_from(key).take(limit).collect()
    }

    // index in `sorted` of the first position at or after `hash`, wrapping around to 0
    pub(super) fn index_of(&self, hash: u32) -> Option<usize> {
        if self.sorted.is_empty() {
            return None;
        }

        match self.sorted.partition_point(|position| *position < hash) {
            index if index == self.sorted.len() => Some(0),
            index => Some(index),
        }
    }
}
