#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};

use crate::hash::HashAlgorithm;

/// repetitions per node used by ketama clients
pub const DEFAULT_REPETITIONS: u32 = 160;

/// occupied positions a node may run into before its placement fails
pub const DEFAULT_MAX_COLLISION_RETRIES: u32 = 1024;

/// Configuration of a [`NodeLocator`](crate::NodeLocator)
///
/// * `hash` - algorithm used for node placement and key lookups
/// * `repetitions` - number of hash invocations per node. Each invocation places
///   `hash.width()` virtual nodes (4 for ketama, 1 otherwise)
/// * `max_collision_retries` - how many already taken positions a node may hit while being placed
///
/// Weights are not part of the configuration, they are passed along with the nodes,
/// see [`NodeLocator::add_weighted_nodes`](crate::NodeLocator::add_weighted_nodes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "derive", serde(default))]
pub struct LocatorConfig {
    pub hash: HashAlgorithm,
    pub repetitions: u32,
    pub max_collision_retries: u32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        LocatorConfig {
            hash: HashAlgorithm::Ketama,
            repetitions: DEFAULT_REPETITIONS,
            max_collision_retries: DEFAULT_MAX_COLLISION_RETRIES,
        }
    }
}

impl LocatorConfig {
    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_max_collision_retries(mut self, retries: u32) -> Self {
        self.max_collision_retries = retries;
        self
    }
}
