use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::{Member, NodeLocator, Slot};
use crate::error::{Error, Result};
use crate::format::NodeKeyFormatter;

/// weight of nodes without an explicit weight on a weighted ring
pub const DEFAULT_WEIGHT: u32 = 1;

// added before flooring the weighted repetition count, so 79.99999999999999 becomes 80
const WEIGHT_ROUNDING_EPSILON: f64 = 1e-10;

/// repetitions granted to a node of `weight` out of `total_weight` on a ring of `nodes` nodes
pub(crate) fn weighted_repetitions(
    weight: u32,
    total_weight: u64,
    repetitions: u32,
    nodes: usize,
) -> u32 {
    if repetitions == 0 || total_weight == 0 {
        return 0;
    }

    let share = f64::from(weight) / total_weight as f64;
    let granted = (share * f64::from(repetitions) * nodes as f64 + WEIGHT_ROUNDING_EPSILON).floor();

    (granted as u32).max(1)
}

impl<N, F> NodeLocator<N, F>
where
    F: NodeKeyFormatter<N>,
{
    /// Add `nodes` to the ring.
    ///
    /// Nodes already on the ring (same base key) are skipped, so adding the same nodes twice
    /// does nothing. New nodes are placed in base key order, which makes the result independent
    /// of the order they are passed in.
    ///
    /// A node that cannot be placed within `max_collision_retries` is left out, the remaining
    /// nodes are still added and the first such error is returned.
    pub fn add_nodes<I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = N>,
    {
        let fresh = self.fresh_nodes(nodes);
        if fresh.is_empty() {
            return Ok(());
        }

        let added = fresh.len();
        let result = self.insert_nodes(fresh);
        debug!(
            added,
            nodes = self.len(),
            positions = self.vlen(),
            "added nodes to ring"
        );
        result
    }

    /// Add `nodes` with a weight each, switching the ring to weighted mode.
    ///
    /// A weight of 0 means no weight. Passing a node that is already on the ring updates its
    /// weight. On a weighted ring every node gets
    /// `floor(weight / total_weight * repetitions * node_count)` repetitions, nodes without a
    /// weight count as [`DEFAULT_WEIGHT`].
    pub fn add_weighted_nodes<I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, u32)>,
    {
        let mut fresh = BTreeMap::new();
        let mut reweighted = false;

        for (node, weight) in nodes {
            let key = self.formatter.base_key(&node);

            let previous = match weight {
                0 => self.weights.remove(&key),
                _ => self.weights.insert(key.clone(), weight),
            };
            reweighted |= previous.unwrap_or(0) != weight;

            if !self.nodes.contains_key(&key) {
                fresh.entry(key).or_insert(node);
            }
        }

        if !reweighted {
            return self.insert_nodes(fresh);
        }

        for (key, node) in fresh {
            self.nodes.insert(key.clone(), Slot::detached(key, node));
        }
        self.rebuild()
    }

    /// Remove `nodes` from the ring.
    ///
    /// Nodes are matched by base key. Positions a node lost to another node during placement are
    /// left alone. Nodes not on the ring are ignored. Only a weighted ring can fail here, when
    /// its rebuild hits the collision retry ceiling. The node named by the error is then no
    /// longer on the ring, and the other nodes are placed by their weight shares without it.
    pub fn remove_nodes<I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<N>,
    {
        let was_weighted = self.is_weighted();
        let mut removed = 0;

        for node in nodes {
            let key = self.formatter.base_key(node.borrow());
            let Some(slot) = self.nodes.remove(&key) else {
                continue;
            };
            self.weights.remove(&key);
            removed += 1;

            if !was_weighted {
                self.unplace(&slot);
            }
        }

        if removed == 0 {
            return Ok(());
        }

        let result = if was_weighted {
            self.rebuild()
        } else {
            self.sort_positions();
            Ok(())
        };
        debug!(
            removed,
            nodes = self.len(),
            positions = self.vlen(),
            "removed nodes from ring"
        );
        result
    }

    /// Replace the nodes of the ring with `nodes`.
    ///
    /// Nodes missing from `nodes` are removed, new ones are added, nodes present in both keep
    /// their positions. If none of the current nodes is kept the ring is cleared at once.
    ///
    /// Nodes that cannot be placed are left out, as in [`add_nodes`](NodeLocator::add_nodes).
    /// On a weighted ring that can also be a node that was on the ring before.
    pub fn set_nodes<I>(&mut self, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = N>,
    {
        let mut wanted = BTreeMap::new();
        for node in nodes {
            let key = self.formatter.base_key(&node);
            wanted.entry(key).or_insert(node);
        }

        let stale: Vec<String> = self
            .nodes
            .keys()
            .filter(|key| !wanted.contains_key(*key))
            .cloned()
            .collect();

        if !stale.is_empty() && stale.len() == self.nodes.len() {
            debug!(removed = stale.len(), "replacing every node of the ring");
            self.remove_all_nodes();
            return self.add_nodes(wanted.into_values());
        }

        let was_weighted = self.is_weighted();
        for key in &stale {
            if let Some(slot) = self.nodes.remove(key) {
                self.weights.remove(key);
                if !was_weighted {
                    self.unplace(&slot);
                }
            }
        }

        wanted.retain(|key, _| !self.nodes.contains_key(key));
        debug!(
            removed = stale.len(),
            added = wanted.len(),
            "reconciling ring nodes"
        );

        if was_weighted && !stale.is_empty() {
            for (key, node) in wanted {
                self.nodes.insert(key.clone(), Slot::detached(key, node));
            }
            return self.rebuild();
        }

        if wanted.is_empty() {
            self.sort_positions();
            return Ok(());
        }
        self.insert_nodes(wanted)
    }

    /// Remove every node from the ring. Weights are dropped as well.
    pub fn remove_all_nodes(&mut self) {
        self.positions.clear();
        self.sorted.clear();
        self.nodes.clear();
        self.weights.clear();
        debug!("removed all nodes from ring");
    }

    /// Returns true if a node with the same base key as `node` is on the ring.
    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains_key(&self.formatter.base_key(node))
    }

    /// Number of positions `node` owns, 0 if it is not on the ring.
    pub fn positions_of(&self, node: &N) -> usize {
        self.nodes
            .get(&self.formatter.base_key(node))
            .map_or(0, |slot| slot.positions)
    }

    /// Weight of `node` if one was set.
    pub fn weight_of(&self, node: &N) -> Option<u32> {
        self.weights.get(&self.formatter.base_key(node)).copied()
    }

    // new nodes by base key, without duplicates and nodes already on the ring
    fn fresh_nodes<I>(&self, nodes: I) -> BTreeMap<String, N>
    where
        I: IntoIterator<Item = N>,
    {
        let mut fresh = BTreeMap::new();
        for node in nodes {
            let key = self.formatter.base_key(&node);
            if !self.nodes.contains_key(&key) {
                fresh.entry(key).or_insert(node);
            }
        }
        fresh
    }

    // place nodes that are not on the ring yet
    fn insert_nodes(&mut self, fresh: BTreeMap<String, N>) -> Result<()> {
        if fresh.is_empty() {
            return Ok(());
        }

        if self.is_weighted() {
            for (key, node) in fresh {
                self.nodes.insert(key.clone(), Slot::detached(key, node));
            }
            return self.rebuild();
        }

        let mut result = Ok(());
        for (key, node) in fresh {
            let placed = self.place(Arc::new(Member { key, node }), self.config.repetitions);
            result = result.and(placed);
        }
        self.sort_positions();
        result
    }

    // Throw away all positions and place every active node again, in base key order. Nodes that
    // cannot be placed are dropped and the survivors are placed once more, so weighted shares
    // are computed over the nodes that end up on the ring. Returns the first placement error.
    fn rebuild(&mut self) -> Result<()> {
        let mut result = Ok(());
        loop {
            match self.place_all() {
                Ok(()) => break,
                Err(err) => result = result.and(Err(err)),
            }
        }
        self.sort_positions();

        debug!(
            weighted = self.is_weighted(),
            nodes = self.len(),
            positions = self.vlen(),
            "rebuilt ring"
        );
        result
    }

    // one placement round over all active nodes, failed nodes are no longer active afterwards
    fn place_all(&mut self) -> Result<()> {
        self.positions.clear();
        let members: Vec<Arc<Member<N>>> = std::mem::take(&mut self.nodes)
            .into_values()
            .map(|slot| slot.member)
            .collect();

        let weighted = self.is_weighted();
        let total_weight: u64 = members
            .iter()
            .map(|member| u64::from(self.effective_weight(&member.key)))
            .sum();
        let count = members.len();

        let mut result = Ok(());
        for member in members {
            let repetitions = match weighted {
                true => weighted_repetitions(
                    self.effective_weight(&member.key),
                    total_weight,
                    self.config.repetitions,
                    count,
                ),
                false => self.config.repetitions,
            };
            result = result.and(self.place(member, repetitions));
        }

        if result.is_err() {
            trace!(total_weight, survivors = self.len(), "placing surviving nodes again");
        }
        result
    }

    fn effective_weight(&self, key: &str) -> u32 {
        self.weights.get(key).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    // Hashes repetitions of `member` and claims every free position they yield. Each position
    // that is taken already counts as a collision and adds one more repetition to hash, up to
    // `max_collision_retries` collisions. Does not touch `sorted`.
    fn place(&mut self, member: Arc<Member<N>>, repetitions: u32) -> Result<()> {
        let mut target = repetitions;
        let mut placed = 0;
        let mut retries = 0;
        let mut repetition = 0;

        while repetition < target {
            let key = self
                .formatter
                .repetition_key(&member.node, &member.key, repetition);

            for position in self.config.hash.hash(key.as_bytes()) {
                match self.positions.entry(position) {
                    Entry::Vacant(entry) => {
                        entry.insert(Arc::clone(&member));
                        placed += 1;
                    }
                    Entry::Occupied(entry) => {
                        trace!(
                            node = %member.key,
                            owner = %entry.get().key,
                            position,
                            repetition,
                            "position already taken"
                        );

                        if retries == self.config.max_collision_retries {
                            warn!(
                                node = %member.key,
                                placed,
                                retries,
                                "giving up placing node"
                            );
                            self.positions
                                .retain(|_, owner| !Arc::ptr_eq(owner, &member));
                            self.weights.remove(&member.key);

                            return Err(Error::PlacementExhausted {
                                node: member.key.clone(),
                                placed,
                                retries,
                            });
                        }
                        retries += 1;
                        target = target.saturating_add(1);
                    }
                }
            }

            repetition += 1;
        }

        self.nodes.insert(
            member.key.clone(),
            Slot {
                member,
                positions: placed,
            },
        );
        Ok(())
    }

    // Removes the positions of `slot` by hashing its repetitions again. Positions owned by other
    // nodes are kept. Does not touch `sorted`.
    fn unplace(&mut self, slot: &Slot<N>) {
        let member = &slot.member;
        let limit = self
            .config
            .repetitions
            .saturating_add(self.config.max_collision_retries);
        let mut remaining = slot.positions;
        let mut repetition = 0;

        while remaining > 0 && repetition < limit {
            let key = self
                .formatter
                .repetition_key(&member.node, &member.key, repetition);

            for position in self.config.hash.hash(key.as_bytes()) {
                if self
                    .positions
                    .get(&position)
                    .is_some_and(|owner| owner.key == member.key)
                {
                    self.positions.remove(&position);
                    remaining -= 1;
                }
            }

            repetition += 1;
        }

        if remaining > 0 {
            // placed with a different repetition count, e.g. on a weighted ring
            self.positions.retain(|_, owner| owner.key != member.key);
        }
    }
}

impl<N> Slot<N> {
    // an active node that has no positions yet, placed by the next rebuild
    fn detached(key: String, node: N) -> Self {
        Slot {
            member: Arc::new(Member { key, node }),
            positions: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::weighted_repetitions;
    use crate::config::LocatorConfig;
    use crate::error::Error;
    use crate::format::NodeKeyFormatter;
    use crate::hash::HashAlgorithm;
    use crate::locator::NodeLocator;
    use pretty_assertions::assert_eq;

    // formatter that makes even repetitions of every node collide
    #[derive(Clone, Debug, Default)]
    struct CollidingFormatter;

    impl NodeKeyFormatter<&'static str> for CollidingFormatter {
        fn base_key(&self, node: &&'static str) -> String {
            node.to_string()
        }

        fn repetition_key(&self, _node: &&'static str, base: &str, repetition: u32) -> String {
            match repetition % 2 {
                0 => format!("shared-{repetition}"),
                _ => format!("{base}-{repetition}"),
            }
        }
    }

    // formatter that hashes every repetition to the same key
    #[derive(Clone, Debug, Default)]
    struct ConstantFormatter;

    impl NodeKeyFormatter<&'static str> for ConstantFormatter {
        fn base_key(&self, node: &&'static str) -> String {
            node.to_string()
        }

        fn repetition_key(&self, _node: &&'static str, base: &str, _repetition: u32) -> String {
            base.to_string()
        }
    }

    // node "x" hashes every repetition to the same key, all other nodes behave normally
    #[derive(Clone, Debug, Default)]
    struct StuckFormatter;

    impl NodeKeyFormatter<&'static str> for StuckFormatter {
        fn base_key(&self, node: &&'static str) -> String {
            node.to_string()
        }

        fn repetition_key(&self, _node: &&'static str, base: &str, repetition: u32) -> String {
            match base {
                "x" => base.to_string(),
                _ => format!("{base}-{repetition}"),
            }
        }
    }

    fn only_a_layout() -> Vec<u32> {
        let config = LocatorConfig::default().with_repetitions(4);
        let mut locator = NodeLocator::with_formatter(config, CollidingFormatter);
        locator.add_nodes(["a"]).unwrap();
        locator.sorted
    }

    fn assert_consistent<N, F>(locator: &NodeLocator<N, F>) {
        assert_eq!(locator.positions.len(), locator.sorted.len());
        assert!(locator.sorted.windows(2).all(|w| w[0] < w[1]));
        assert!(
            locator
                .sorted
                .iter()
                .all(|position| locator.positions.contains_key(position))
        );
        let owned: usize = locator.nodes.values().map(|slot| slot.positions).sum();
        assert_eq!(locator.positions.len(), owned);
    }

    #[test]
    fn add_nodes_places_every_repetition() {
        let mut locator: NodeLocator<&str> = NodeLocator::new();
        locator.add_nodes(["abcdefg", "hijklmn", "opqrstu"]).unwrap();

        assert_eq!(3, locator.len());
        assert_eq!(3 * 160 * 4, locator.vlen());
        for node in ["abcdefg", "hijklmn", "opqrstu"] {
            assert!(locator.contains(&node));
            assert_eq!(640, locator.positions_of(&node));
        }
        assert_consistent(&locator);
    }

    #[test]
    fn add_nodes_is_idempotent() {
        let mut locator: NodeLocator<String> = NodeLocator::new();
        let nodes = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        locator.add_nodes(nodes.clone()).unwrap();
        let sorted = locator.sorted.clone();
        let owners: Vec<String> = sorted
            .iter()
            .map(|position| locator.positions[position].key.clone())
            .collect();

        locator.add_nodes(nodes).unwrap();
        locator.add_nodes(vec!["b".to_string(), "b".to_string()]).unwrap();

        assert_eq!(sorted, locator.sorted);
        assert_eq!(
            owners,
            locator
                .sorted
                .iter()
                .map(|position| locator.positions[position].key.clone())
                .collect::<Vec<_>>()
        );
        assert_eq!(3, locator.len());
    }

    #[test]
    fn add_order_does_not_matter() {
        let mut forward: NodeLocator<&str> = NodeLocator::new();
        forward.add_nodes(["a", "b"]).unwrap();
        forward.add_nodes(["c"]).unwrap();

        let mut backward: NodeLocator<&str> = NodeLocator::new();
        backward.add_nodes(["c"]).unwrap();
        backward.add_nodes(["b", "a"]).unwrap();

        assert_eq!(forward.sorted, backward.sorted);
        for position in &forward.sorted {
            assert_eq!(
                forward.positions[position].key,
                backward.positions[position].key
            );
        }
    }

    #[test]
    fn remove_restores_previous_ring() {
        let mut only_a: NodeLocator<&str> = NodeLocator::new();
        only_a.add_nodes(["a"]).unwrap();

        let mut locator: NodeLocator<&str> = NodeLocator::new();
        locator.add_nodes(["a"]).unwrap();
        locator.add_nodes(["b"]).unwrap();
        locator.remove_nodes(["b"]).unwrap();

        assert_eq!(only_a.sorted, locator.sorted);
        assert_eq!(vec![&"a"], locator.get_all_nodes());
        assert!(!locator.contains(&"b"));
        assert_eq!(0, locator.positions_of(&"b"));
        assert_consistent(&locator);

        // unknown nodes are ignored
        locator.remove_nodes(["x"]).unwrap();
        assert_eq!(only_a.sorted, locator.sorted);

        locator.remove_nodes(&["a"]).unwrap();
        assert!(locator.is_empty());
        assert_eq!(0, locator.vlen());
        assert_eq!(Err(Error::EmptyRing), locator.get_max_hash_key());
    }

    #[test]
    fn collisions_are_made_up_by_later_repetitions() {
        let config = LocatorConfig::default().with_repetitions(4);
        let mut locator = NodeLocator::with_formatter(config, CollidingFormatter);

        locator.add_nodes(["a", "b"]).unwrap();

        // "a" is placed first and takes shared-0 and shared-2. Each of the 8 positions "b" finds
        // taken adds a repetition, so "b" hashes repetitions 0 to 11 and owns 1, 3 and 4 to 11
        assert_eq!(16, locator.positions_of(&"a"));
        assert_eq!(40, locator.positions_of(&"b"));
        assert_eq!(56, locator.vlen());
        assert_consistent(&locator);

        let shared: Vec<u32> = ["shared-0", "shared-2"]
            .iter()
            .flat_map(|key| HashAlgorithm::Ketama.hash(key.as_bytes()))
            .collect();
        for position in &shared {
            assert_eq!("a", locator.positions[position].key);
        }

        // removing "b" keeps the shared positions of "a"
        let mut without_b = locator.clone();
        without_b.remove_nodes(["b"]).unwrap();
        assert_eq!(16, without_b.vlen());
        assert_eq!(only_a_layout(), without_b.sorted);
        for position in &shared {
            assert_eq!("a", without_b.positions[position].key);
        }
        assert_consistent(&without_b);

        // removing "a" does not touch positions of "b"
        locator.remove_nodes(["a"]).unwrap();
        assert_eq!(40, locator.vlen());
        assert!(
            locator
                .positions
                .values()
                .all(|owner| owner.key == "b")
        );
        for position in &shared {
            assert!(!locator.positions.contains_key(position));
        }
        assert_consistent(&locator);
    }

    #[test]
    fn placement_gives_up_after_max_retries() {
        let config = LocatorConfig::default().with_max_collision_retries(10);
        let mut locator = NodeLocator::with_formatter(config, ConstantFormatter);

        let result = locator.add_nodes(["a", "b"]);

        assert_eq!(
            Err(Error::PlacementExhausted {
                node: "a".to_string(),
                placed: 4,
                retries: 10,
            }),
            result
        );
        // "b" fails the same way, the ring stays empty
        assert!(locator.is_empty());
        assert_eq!(0, locator.vlen());
        assert_consistent(&locator);
    }

    #[test]
    fn collision_ceiling_bounds_extra_repetitions() {
        let config = LocatorConfig::default()
            .with_repetitions(4)
            .with_max_collision_retries(8);
        let mut locator = NodeLocator::with_formatter(config, CollidingFormatter);

        // "b" needs exactly 8 retries and gets placed
        locator.add_nodes(["a", "b"]).unwrap();
        assert_eq!(40, locator.positions_of(&"b"));

        // "c" places repetitions 1 and 3, then gives up at shared-4 owned by "b"
        let result = locator.add_nodes(["c"]);
        assert_eq!(
            Err(Error::PlacementExhausted {
                node: "c".to_string(),
                placed: 8,
                retries: 8,
            }),
            result
        );
        assert!(!locator.contains(&"c"));
        assert_eq!(56, locator.vlen());
        assert_consistent(&locator);
    }

    #[test]
    fn weighted_rebuild_shares_weight_among_placed_nodes() {
        let config = LocatorConfig::default()
            .with_hash(HashAlgorithm::Crc32)
            .with_repetitions(10)
            .with_max_collision_retries(10);
        let mut locator = NodeLocator::with_formatter(config, StuckFormatter);

        let result = locator.add_weighted_nodes([("a", 1), ("b", 1), ("x", 2)]);

        assert_eq!(
            Err(Error::PlacementExhausted {
                node: "x".to_string(),
                placed: 1,
                retries: 10,
            }),
            result
        );
        assert!(!locator.contains(&"x"));
        assert_eq!(None, locator.weight_of(&"x"));
        // total weight 2 over 2 nodes, not 4 over 3
        assert_eq!(10, locator.positions_of(&"a"));
        assert_eq!(10, locator.positions_of(&"b"));
        assert_consistent(&locator);

        // later rebuilds only share weight among nodes on the ring
        locator.add_weighted_nodes([("c", 2)]).unwrap();
        assert_eq!(
            weighted_repetitions(2, 4, 10, 3) as usize,
            locator.positions_of(&"c")
        );
        locator.remove_nodes(["a"]).unwrap();
        assert_eq!(
            weighted_repetitions(1, 3, 10, 2) as usize,
            locator.positions_of(&"b")
        );
        assert_consistent(&locator);
    }

    #[test]
    fn set_nodes_reconciles_membership() {
        let mut locator: NodeLocator<&str> = NodeLocator::new();
        locator.add_nodes(["a", "b", "c"]).unwrap();

        let mut expected: NodeLocator<&str> = NodeLocator::new();
        expected.add_nodes(["b", "c", "d"]).unwrap();

        locator.set_nodes(["d", "c", "b"]).unwrap();

        assert_eq!(vec![&"b", &"c", &"d"], locator.get_all_nodes());
        assert_eq!(expected.sorted, locator.sorted);
        assert_consistent(&locator);

        // nothing changes
        locator.set_nodes(["b", "c", "d"]).unwrap();
        assert_eq!(expected.sorted, locator.sorted);

        // every node replaced
        locator.set_nodes(["x", "y"]).unwrap();
        assert_eq!(vec![&"x", &"y"], locator.get_all_nodes());
        assert_eq!(2 * 640, locator.vlen());
        assert_consistent(&locator);

        locator.set_nodes([]).unwrap();
        assert!(locator.is_empty());
        assert_eq!(0, locator.vlen());
    }

    #[test]
    fn remove_all_nodes_resets_ring() {
        let mut locator: NodeLocator<&str> = NodeLocator::new();
        locator.add_weighted_nodes([("a", 2), ("b", 1)]).unwrap();
        assert!(locator.is_weighted());

        locator.remove_all_nodes();

        assert!(locator.is_empty());
        assert!(!locator.is_weighted());
        assert_eq!(0, locator.vlen());
        assert_eq!(Err(Error::EmptyRing), locator.get_max_hash_key());
    }

    #[test]
    fn weighted_repetitions_follow_share_of_total() {
        assert_eq!(80, weighted_repetitions(1, 6, 160, 3));
        assert_eq!(160, weighted_repetitions(2, 6, 160, 3));
        assert_eq!(240, weighted_repetitions(3, 6, 160, 3));
        assert_eq!(160, weighted_repetitions(5, 5, 160, 1));
        // tiny shares still get a position
        assert_eq!(1, weighted_repetitions(1, 10_000, 160, 2));
        assert_eq!(0, weighted_repetitions(1, 2, 0, 2));
    }

    #[test]
    fn weighted_nodes_get_positions_by_weight() {
        let mut locator: NodeLocator<&str> = NodeLocator::new();
        locator
            .add_weighted_nodes([("a", 1), ("b", 2), ("c", 3)])
            .unwrap();

        assert!(locator.is_weighted());
        assert_eq!(Some(2), locator.weight_of(&"b"));
        assert_eq!(80 * 4, locator.positions_of(&"a"));
        assert_eq!(160 * 4, locator.positions_of(&"b"));
        assert_eq!(240 * 4, locator.positions_of(&"c"));
        assert_consistent(&locator);

        // an unweighted node counts as weight 1: total 7 over 4 nodes
        locator.add_nodes(["d"]).unwrap();
        assert_eq!(None, locator.weight_of(&"d"));
        assert_eq!(
            weighted_repetitions(1, 7, 160, 4) as usize * 4,
            locator.positions_of(&"d")
        );
        assert_eq!(
            weighted_repetitions(3, 7, 160, 4) as usize * 4,
            locator.positions_of(&"c")
        );
        assert_consistent(&locator);

        // removal rebuilds with the remaining weights
        locator.remove_nodes(["d"]).unwrap();
        assert_eq!(240 * 4, locator.positions_of(&"c"));
        assert_consistent(&locator);
    }

    #[test]
    fn weighted_counts_converge_to_share() {
        let weights = [("a", 1_u32), ("b", 3), ("c", 4)];
        let total: u32 = weights.iter().map(|(_, weight)| weight).sum();

        for repetitions in [10_u32, 100, 1000] {
            let config = LocatorConfig::default()
                .with_hash(HashAlgorithm::Fnv1a_64)
                .with_repetitions(repetitions);
            let mut locator: NodeLocator<&str> = NodeLocator::with_config(config);
            locator.add_weighted_nodes(weights).unwrap();

            for (node, weight) in weights {
                let expected =
                    f64::from(weight) / f64::from(total) * f64::from(repetitions) * 3.0;
                let measured = locator.positions_of(&node) as f64;
                assert!(
                    (measured - expected).abs() <= 1.0,
                    "{node}: {measured} positions, expected about {expected}"
                );
            }
        }
    }

    #[test]
    fn dropping_weights_returns_to_equal_repetitions() {
        let mut plain: NodeLocator<&str> = NodeLocator::new();
        plain.add_nodes(["a", "b"]).unwrap();

        let mut locator: NodeLocator<&str> = NodeLocator::new();
        locator.add_weighted_nodes([("a", 3), ("b", 1)]).unwrap();
        assert!(locator.positions_of(&"a") > locator.positions_of(&"b"));

        locator.add_weighted_nodes([("a", 0), ("b", 0)]).unwrap();

        assert!(!locator.is_weighted());
        assert_eq!(plain.sorted, locator.sorted);
    }

    #[test]
    fn set_nodes_on_weighted_ring_keeps_weights_of_survivors() {
        let mut locator: NodeLocator<&str> = NodeLocator::new();
        locator
            .add_weighted_nodes([("a", 1), ("b", 1), ("c", 2)])
            .unwrap();

        locator.set_nodes(["b", "c"]).unwrap();

        assert_eq!(None, locator.weight_of(&"a"));
        assert_eq!(Some(2), locator.weight_of(&"c"));
        // total 3 over 2 nodes
        assert_eq!(
            weighted_repetitions(1, 3, 160, 2) as usize * 4,
            locator.positions_of(&"b")
        );
        assert_eq!(
            weighted_repetitions(2, 3, 160, 2) as usize * 4,
            locator.positions_of(&"c")
        );
        assert_consistent(&locator);
    }
}
