//! Publishing rings to concurrent readers.

use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use crate::error::Result;
use crate::format::{NodeKeyFormatter, SelfFormatter};
use crate::locator::NodeLocator;

/// SharedLocator hands out immutable snapshots of a [`NodeLocator`]
///
/// Readers call [`load`](SharedLocator::load) and keep using the snapshot they got, without
/// holding any lock. Writers build the next ring from a copy of the current one and publish it
/// with a pointer swap, one writer at a time.
#[derive(Debug)]
pub struct SharedLocator<N, F = SelfFormatter> {
    current: RwLock<Arc<NodeLocator<N, F>>>,
    writer: Mutex<()>,
}

impl<N, F> SharedLocator<N, F> {
    pub fn new(locator: NodeLocator<N, F>) -> Self {
        SharedLocator {
            current: RwLock::new(Arc::new(locator)),
            writer: Mutex::new(()),
        }
    }

    /// The ring as of now.
    pub fn load(&self) -> Arc<NodeLocator<N, F>> {
        Arc::clone(&self.current.read().expect("lock poisoned"))
    }

    /// Owned copy of the node responsible for `key` on the current ring.
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<N>
    where
        N: Clone,
    {
        self.load().get(key).cloned()
    }
}

impl<N, F> SharedLocator<N, F>
where
    F: NodeKeyFormatter<N> + Clone,
{
    /// Apply `change` to a copy of the current ring and publish the copy if `change` succeeds.
    ///
    /// Readers see either the old or the new ring, never a partially updated one. If `change`
    /// fails the current ring stays in place and the error is returned.
    pub fn update<R>(
        &self,
        change: impl FnOnce(&mut NodeLocator<N, F>) -> Result<R>,
    ) -> Result<R> {
        let _writer = self.writer.lock().expect("lock poisoned");

        let mut next = NodeLocator::clone(&self.load());
        let outcome = change(&mut next)?;

        debug!(
            nodes = next.len(),
            positions = next.vlen(),
            "publishing ring"
        );
        *self.current.write().expect("lock poisoned") = Arc::new(next);

        Ok(outcome)
    }

    pub fn add_nodes<I: IntoIterator<Item = N>>(&self, nodes: I) -> Result<()> {
        self.update(|ring| ring.add_nodes(nodes))
    }

    pub fn remove_nodes<I: IntoIterator<Item = N>>(&self, nodes: I) -> Result<()> {
        self.update(|ring| ring.remove_nodes(nodes))
    }

    pub fn set_nodes<I: IntoIterator<Item = N>>(&self, nodes: I) -> Result<()> {
        self.update(|ring| ring.set_nodes(nodes))
    }

    pub fn remove_all_nodes(&self) {
        let _writer = self.writer.lock().expect("lock poisoned");

        let current = self.load();
        let next = NodeLocator::with_formatter(*current.config(), current.formatter().clone());

        debug!("publishing empty ring");
        *self.current.write().expect("lock poisoned") = Arc::new(next);
    }
}

impl<N, F> From<NodeLocator<N, F>> for SharedLocator<N, F> {
    fn from(locator: NodeLocator<N, F>) -> Self {
        SharedLocator::new(locator)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::SharedLocator;
    use crate::error::Error;
    use crate::locator::NodeLocator;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshots_are_not_affected_by_updates() {
        let shared: SharedLocator<String> = SharedLocator::new(NodeLocator::new());
        shared
            .add_nodes(vec!["a".to_string(), "b".to_string()])
            .unwrap();

        let snapshot = shared.load();
        shared.remove_nodes(vec!["b".to_string()]).unwrap();

        assert_eq!(2, snapshot.len());
        assert_eq!(1, shared.load().len());
        assert_eq!(Some("a".to_string()), shared.get("foo"));

        shared.remove_all_nodes();
        assert!(shared.load().is_empty());
        assert_eq!(2, snapshot.len());
        assert_eq!(None, shared.get("foo"));
    }

    #[test]
    fn failed_update_keeps_current_ring() {
        let shared: SharedLocator<&str> = SharedLocator::new(NodeLocator::new());
        shared.add_nodes(["a"]).unwrap();
        let before = shared.load();

        let result = shared.update(|ring| {
            ring.add_nodes(["b"])?;
            ring.remove_nodes(["a"])
        });
        assert_eq!(Ok(()), result);
        assert_eq!(vec![&"b"], shared.load().get_all_nodes());

        let result = shared.update(|ring| {
            ring.remove_all_nodes();
            ring.add_nodes(["c"])?;
            Err::<(), _>(Error::EmptyRing)
        });

        assert_eq!(Err(Error::EmptyRing), result);
        assert_eq!(vec![&"b"], shared.load().get_all_nodes());
        assert_eq!(vec![&"a"], before.get_all_nodes());
    }

    #[test]
    fn readers_see_complete_rings() {
        let shared: Arc<SharedLocator<String>> = Arc::new(SharedLocator::new(NodeLocator::new()));
        shared
            .set_nodes((0..4).map(|i| format!("node-{i}")))
            .unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for i in 0..2_000 {
                        let ring = shared.load();
                        let nodes = ring.get_n(format!("key-{i}"), 2);
                        assert_eq!(4, ring.len());
                        assert_eq!(2, nodes.len());
                    }
                })
            })
            .collect();

        for round in 0..20 {
            shared
                .set_nodes((round..round + 4).map(|i| format!("node-{i}")))
                .unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(4, shared.load().len());
    }
}
