//! UUID to receiver registry with amortised pruning.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::receiver::ReceiverShared;

struct RegistryInner {
    entries: HashMap<Uuid, Weak<ReceiverShared>>,
    last_prune: Instant,
}

/// Maps in-flight message UUIDs to the receivers waiting on them.
///
/// Entries are weak: the consumer's receiver is the owner, and an entry
/// whose receiver has been dropped is garbage. Dead entries are removed
/// eagerly when a lookup hits one, and by a full sweep at most once per
/// prune interval on the dispatch path.
pub(crate) struct ResponseRegistry {
    inner: Mutex<RegistryInner>,
    prune_interval: Duration,
}

impl ResponseRegistry {
    pub(crate) fn new(prune_interval: Duration) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                entries: HashMap::new(),
                last_prune: Instant::now(),
            }),
            prune_interval,
        }
    }

    /// Insert a fresh receiver. The UUID generator is trusted to be
    /// unique; a duplicate registration is a programming bug.
    pub(crate) fn register(&self, receiver: &Arc<ReceiverShared>) {
        let mut inner = self.inner.lock().expect("response registry lock poisoned");
        let previous = inner
            .entries
            .insert(receiver.uuid(), Arc::downgrade(receiver));
        debug_assert!(previous.is_none(), "duplicate message uuid registered");
    }

    /// Look up the receiver for a chunk.
    ///
    /// Runs the amortised full sweep first when it is due, so dispatch
    /// stays O(1) in the common case.
    pub(crate) fn lookup_for_dispatch(&self, uuid: &Uuid) -> Option<Arc<ReceiverShared>> {
        let mut inner = self.inner.lock().expect("response registry lock poisoned");
        if inner.last_prune.elapsed() >= self.prune_interval {
            inner.entries.retain(|_, entry| entry.strong_count() > 0);
            inner.last_prune = Instant::now();
        }
        match inner.entries.get(uuid) {
            Some(entry) => match entry.upgrade() {
                Some(receiver) => Some(receiver),
                None => {
                    inner.entries.remove(uuid);
                    None
                }
            },
            None => None,
        }
    }

    /// Drop every entry whose receiver is gone, unconditionally.
    pub(crate) fn prune(&self) {
        let mut inner = self.inner.lock().expect("response registry lock poisoned");
        inner.entries.retain(|_, entry| entry.strong_count() > 0);
        inner.last_prune = Instant::now();
    }

    /// Mark every live receiver terminal. Used at service teardown.
    pub(crate) fn terminate_all(&self) {
        let receivers: Vec<Arc<ReceiverShared>> = {
            let inner = self.inner.lock().expect("response registry lock poisoned");
            inner.entries.values().filter_map(Weak::upgrade).collect()
        };
        // The registry lock is released before touching receiver locks.
        for receiver in receivers {
            receiver.finish();
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("response registry lock poisoned")
            .entries
            .len()
    }
}
