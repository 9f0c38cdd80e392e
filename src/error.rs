//! Error types of the node locator.

/// Errors returned by [`NodeLocator`](crate::NodeLocator) and the configuration parsers.
///
/// Lookups never fail: a missing node is reported as `None` or an empty `Vec`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The ring holds no positions.
    #[error("ring is empty")]
    EmptyRing,

    /// A node kept colliding with occupied positions until the retry ceiling was reached.
    ///
    /// The node is not part of the ring afterwards.
    #[error("could not place node {node}: {placed} positions placed after {retries} collision retries")]
    PlacementExhausted {
        /// Base key of the node that could not be placed.
        node: String,
        /// Positions that were placed before giving up.
        placed: usize,
        /// Occupied positions hit before giving up.
        retries: u32,
    },

    #[error("unknown hash algorithm: {0}")]
    UnknownHashAlgorithm(String),

    #[error("unknown node key format: {0}")]
    UnknownKeyFormat(String),

    #[error("invalid server address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, Error>;
