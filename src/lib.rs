//! A node locator for consistent hashing, compatible with the ketama convention of memcached clients
//!
//! The locator places every server (node) on a ring of `u32` positions several times and answers
//! which node is responsible for a key: the first node found clockwise from the hash of the key.
//! Adding or removing a node only remaps the keys in the ranges that node gains or loses, roughly
//! `1/N` of all keys, instead of almost all keys as `hash % N` would.
//!
//! Building blocks:
//! - [`HashAlgorithm`]: turns keys into ring positions. Ketama (MD5, four positions per call) is the default
//! - [`NodeKeyFormatter`]: renders nodes into the keys that are hashed. Nodes rendering the same base key are the same server
//! - [`NodeLocator`]: the ring. Add, remove and set nodes, then `get`, `get_two` or `get_n` for keys
//! - [`SharedLocator`]: publishes new rings to concurrent readers without locking them out
//!
//! Nodes can carry weights, see [`NodeLocator::add_weighted_nodes`]. A weighted ring gives every
//! node a number of virtual nodes proportional to its share of the total weight.
//!
//! ```
//! use ketama_locator::NodeLocator;
//!
//! let mut locator: NodeLocator<&str> = NodeLocator::new();
//! locator.add_nodes(["abcdefg", "hijklmn", "opqrstu"]).unwrap();
//!
//! assert_eq!(Some(&"abcdefg"), locator.get("ggg"));
//! assert_eq!(3, locator.get_n("ggg", 5).len());
//! ```

mod config;
mod error;
mod format;
mod hash;
mod locator;
mod shared;

pub use config::{DEFAULT_MAX_COLLISION_RETRIES, DEFAULT_REPETITIONS, LocatorConfig};
pub use error::{Error, Result};
pub use format::{
    AddressFormatter, DEFAULT_MEMCACHED_PORT, FormatKey, KeyFormat, NodeAddress,
    NodeKeyFormatter, SelfFormatter, ServerAddr,
};
pub use hash::HashAlgorithm;
pub use locator::{Clockwise, DEFAULT_WEIGHT, NodeLocator};
pub use shared::SharedLocator;
