use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::LocatorConfig;
use crate::error::{Error, Result};
use crate::format::SelfFormatter;
use crate::hash::HashAlgorithm;

mod crud;
mod iterator;
mod lookup;

pub use crud::DEFAULT_WEIGHT;
pub use iterator::Clockwise;

// Member is an internal struct shared by every position a node owns on the ring.
// `key` is the base key of the node, the identity used for all node comparisons.
#[derive(Debug)]
struct Member<N> {
    key: String,
    node: N,
}

// Slot tracks an active node together with the number of positions it owns
#[derive(Debug)]
struct Slot<N> {
    member: Arc<Member<N>>,
    positions: usize,
}

impl<N> Clone for Slot<N> {
    fn clone(&self) -> Self {
        Slot {
            member: Arc::clone(&self.member),
            positions: self.positions,
        }
    }
}

/// NodeLocator finds the node responsible for a key using consistent hashing
///
/// Every node is placed on a ring of `u32` positions several times (virtual nodes). A key belongs
/// to the first node found clockwise from the position of the key. Adding or removing a node only
/// moves the keys in the ranges that node gains or loses.
///
/// Nodes are identified by the base key produced by the formatter `F`, not by `PartialEq`:
/// two node values with the same base key are the same server for the ring.
///
/// The locator does no locking. Mutations take `&mut self`, lookups `&self`. Wrap it in
/// [`SharedLocator`](crate::SharedLocator) to publish new rings to concurrent readers.
#[derive(Debug)]
pub struct NodeLocator<N, F = SelfFormatter> {
    config: LocatorConfig,
    formatter: F,
    // position -> node owning it
    positions: HashMap<u32, Arc<Member<N>>>,
    // all keys of `positions`, ascending
    sorted: Vec<u32>,
    // active nodes by base key
    nodes: BTreeMap<String, Slot<N>>,
    // nonzero weights by base key, the ring is weighted while this is not empty
    weights: BTreeMap<String, u32>,
}

impl<N> Default for NodeLocator<N> {
    fn default() -> Self {
        NodeLocator::with_config(LocatorConfig::default())
    }
}

impl<N> NodeLocator<N> {
    /// Create a new `NodeLocator` for self formatting nodes, using ketama with 160 repetitions.
    pub fn new() -> NodeLocator<N> {
        NodeLocator::default()
    }

    /// Create a new `NodeLocator` for self formatting nodes.
    pub fn with_config(config: LocatorConfig) -> NodeLocator<N> {
        NodeLocator::with_formatter(config, SelfFormatter)
    }
}

impl<N, F> NodeLocator<N, F> {
    /// Creates an empty `NodeLocator` which will render nodes with the given formatter.
    ///
    /// # Arguments
    ///
    /// * `config` - hash algorithm, repetitions and collision retry ceiling
    /// * `formatter` - implementation of [`NodeKeyFormatter`](crate::NodeKeyFormatter) for `N`
    ///
    /// # Examples
    ///
    /// ```
    /// use ketama_locator::{AddressFormatter, KeyFormat, LocatorConfig, NodeLocator, ServerAddr};
    ///
    /// let formatter = AddressFormatter::new(KeyFormat::Libmemcached);
    /// let mut locator = NodeLocator::with_formatter(LocatorConfig::default(), formatter);
    ///
    /// locator
    ///     .add_nodes(vec![
    ///         ServerAddr::new("10.0.0.1", 11211),
    ///         ServerAddr::new("10.0.0.2", 11211),
    ///     ])
    ///     .unwrap();
    ///
    /// assert!(locator.get("foo").is_some());
    /// ```
    pub fn with_formatter(config: LocatorConfig, formatter: F) -> NodeLocator<N, F> {
        NodeLocator {
            config,
            formatter,
            positions: HashMap::new(),
            sorted: Vec::new(),
            nodes: BTreeMap::new(),
            weights: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    pub fn formatter(&self) -> &F {
        &self.formatter
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.config.hash
    }

    /// Configured number of hash invocations per node.
    pub fn repetitions(&self) -> u32 {
        self.config.repetitions
    }

    /// Get the number of real nodes in the ring.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of virtual nodes (positions) in the ring.
    pub fn vlen(&self) -> usize {
        self.sorted.len()
    }

    /// Returns true if the ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true once any node carries a nonzero weight.
    pub fn is_weighted(&self) -> bool {
        !self.weights.is_empty()
    }

    /// All active nodes, ordered by base key.
    pub fn get_all_nodes(&self) -> Vec<&N> {
        self.nodes.values().map(|slot| &slot.member.node).collect()
    }

    /// Highest position on the ring, `Error::EmptyRing` if there is none.
    pub fn get_max_hash_key(&self) -> Result<u32> {
        self.sorted.last().copied().ok_or(Error::EmptyRing)
    }

    // keep `sorted` in line with `positions`
    fn sort_positions(&mut self) {
        self.sorted = self.positions.keys().copied().collect();
        self.sorted.sort_unstable();
    }
}

impl<N, F: Clone> Clone for NodeLocator<N, F> {
    fn clone(&self) -> Self {
        NodeLocator {
            config: self.config,
            formatter: self.formatter.clone(),
            positions: self.positions.clone(),
            sorted: self.sorted.clone(),
            nodes: self.nodes.clone(),
            weights: self.weights.clone(),
        }
    }
}

impl<'a, N, F> IntoIterator for &'a NodeLocator<N, F> {
    type Item = &'a N;

    type IntoIter = std::vec::IntoIter<&'a N>;

    fn into_iter(self) -> Self::IntoIter {
        self.get_all_nodes().into_iter()
    }
}
