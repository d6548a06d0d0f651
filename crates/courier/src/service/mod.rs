//! Service router: the handle map, the submission path, discovery
//! ingestion, chunk dispatch, and the deadline sweeper.
//!
//! Lock order, outermost first: handle map, unhandled store, response
//! registry, per-receiver state. Every path below acquires locks in that
//! order or skips levels; none inverts it.

mod receiver;
mod registry;
mod sweeper;
mod unhandled;

pub use receiver::{Receiver, Reply};

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use courier_core::{Endpoint, ErrorCode, Message, ResponseChunk};

use crate::discovery::EndpointSnapshot;
use crate::handle::{ChunkCallback, Handle, HandleFactory, HandleInfo};

use self::receiver::ReceiverShared;
use self::registry::ResponseRegistry;
use self::sweeper::Sweeper;
use self::unhandled::UnhandledStore;

/// Default deadline sweeper cadence.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(100);
/// Default minimum spacing between registry prune passes.
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(1);

/// Identity of a service: its alias and the remote application name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub app: String,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app: app.into(),
        }
    }
}

/// Runtime tuning knobs for one service router.
#[derive(Clone, Copy, Debug)]
pub struct ServiceTuning {
    pub sweep_interval: Duration,
    pub prune_interval: Duration,
}

impl Default for ServiceTuning {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }
}

struct ServiceState {
    info: ServiceInfo,
    factory: Arc<dyn HandleFactory>,
    handles: Mutex<HashMap<String, Arc<dyn Handle>>>,
    unhandled: UnhandledStore,
    registry: ResponseRegistry,
    snapshot_gate: Mutex<()>,
    running: AtomicBool,
    dead: AtomicBool,
}

impl ServiceState {
    /// Match one response chunk against its registered receiver.
    ///
    /// The registry lock is released before delivery so the receiver's
    /// own lock is never taken under it.
    fn dispatch_chunk(&self, chunk: ResponseChunk) {
        let Some(receiver) = self.registry.lookup_for_dispatch(&chunk.uuid) else {
            tracing::trace!(uuid = %chunk.uuid, "dropping chunk without a live receiver");
            return;
        };
        receiver.deliver(chunk.body);
    }

    /// Fail every unhandled message whose deadline has passed.
    fn expire_deadlined(&self) {
        self.unhandled.expire(Instant::now(), |message| {
            tracing::error!(
                uuid = %message.uuid(),
                path = %message.path(),
                waited_ms = message.enqueued_at().elapsed().as_millis() as u64,
                "deadline exceeded for unhandled message"
            );
            self.dispatch_chunk(ResponseChunk::error(
                message.uuid(),
                ErrorCode::Deadline,
                "unhandled message expired",
            ));
        });
    }

    /// Kill one handle and return its in-flight messages to the
    /// unhandled store, in order: kill, drain, append, remove.
    fn destroy_handle(&self, name: &str) {
        let mut handles = self.handles.lock().expect("handle map lock poisoned");
        let Some(handle) = handles.get(name).cloned() else {
            tracing::error!(handle = name, "no handle to destroy");
            return;
        };
        tracing::info!(handle = %handle.info(), "destroy handle");

        handle.kill();
        let drained = handle.drain();
        if !drained.is_empty() {
            tracing::debug!(
                handle = name,
                queued = drained.len(),
                "returning handle messages to the unhandled store"
            );
        }
        self.unhandled.append_bulk(name, drained);
        handles.remove(name);
    }
}

/// Router for one named remote service.
///
/// Owns the handle map, the unhandled store, the response registry, and
/// a deadline sweeper thread. Dropping the service kills every handle
/// and marks still-held receivers terminal.
pub struct Service {
    state: Arc<ServiceState>,
    sweeper: Sweeper,
}

impl Service {
    pub fn new(info: ServiceInfo, factory: Arc<dyn HandleFactory>) -> Self {
        Self::with_tuning(info, factory, ServiceTuning::default())
    }

    pub fn with_tuning(
        info: ServiceInfo,
        factory: Arc<dyn HandleFactory>,
        tuning: ServiceTuning,
    ) -> Self {
        let state = Arc::new(ServiceState {
            info,
            factory,
            handles: Mutex::new(HashMap::new()),
            unhandled: UnhandledStore::new(),
            registry: ResponseRegistry::new(tuning.prune_interval),
            snapshot_gate: Mutex::new(()),
            running: AtomicBool::new(true),
            dead: AtomicBool::new(false),
        });
        let sweep_state = Arc::clone(&state);
        let sweeper = Sweeper::spawn(tuning.sweep_interval, move || {
            sweep_state.expire_deadlined();
        });
        Self { state, sweeper }
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.state.info
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    pub fn is_dead(&self) -> bool {
        self.state.dead.load(Ordering::SeqCst)
    }

    /// Register a receiver for the message, then route it to a live
    /// handle or park it in the unhandled store.
    pub fn send_message(&self, message: Message) -> Receiver {
        let shared = Arc::new(ReceiverShared::new(message.uuid(), message.path().clone()));
        self.state.registry.register(&shared);

        let handles = self.state.handles.lock().expect("handle map lock poisoned");
        match handles.get(&message.path().handle) {
            Some(handle) => {
                tracing::debug!(
                    uuid = %message.uuid(),
                    path = %message.path(),
                    size = message.size(),
                    "enqueued message to existing handle"
                );
                handle.enqueue(message);
            }
            None => {
                tracing::debug!(
                    uuid = %message.uuid(),
                    path = %message.path(),
                    size = message.size(),
                    "queued message as unhandled"
                );
                self.state.unhandled.append(message);
            }
        }
        Receiver::new(shared)
    }

    /// Apply one discovery snapshot: destroy handles the snapshot no
    /// longer names, create new ones, refresh the endpoint pools of
    /// survivors. Snapshots are serialised; submissions and dispatches
    /// interleave freely.
    pub fn refresh_handles(&self, snapshot: &EndpointSnapshot) {
        let _gate = self
            .state
            .snapshot_gate
            .lock()
            .expect("snapshot gate poisoned");

        let outstanding: Vec<String> = {
            let handles = self.state.handles.lock().expect("handle map lock poisoned");
            handles
                .keys()
                .filter(|name| !snapshot.contains_key(*name))
                .cloned()
                .collect()
        };
        for name in &outstanding {
            self.state.destroy_handle(name);
        }

        for (name, endpoints) in snapshot {
            self.create_or_update_handle(name, endpoints);
        }
    }

    fn create_or_update_handle(&self, name: &str, endpoints: &BTreeSet<Endpoint>) {
        let mut handles = self.state.handles.lock().expect("handle map lock poisoned");
        if let Some(handle) = handles.get(name) {
            handle.update_endpoints(endpoints);
            return;
        }

        let info = HandleInfo {
            name: name.to_string(),
            service: self.state.info.name.clone(),
            app: self.state.info.app.clone(),
        };
        tracing::info!(handle = %info, endpoints = endpoints.len(), "create handle");

        let dispatch_state = Arc::downgrade(&self.state);
        let on_chunk: ChunkCallback = Arc::new(move |chunk| {
            if let Some(state) = dispatch_state.upgrade() {
                state.dispatch_chunk(chunk);
            }
        });
        let handle = self.state.factory.create(info, endpoints, on_chunk);

        // The proxy is chunk-ready at this point; only now hand it the
        // backlog, since the first enqueue can produce an immediate
        // response.
        let backlog = self.state.unhandled.take(name);
        if backlog.is_empty() {
            tracing::debug!(handle = name, "no unhandled backlog for new handle");
        } else {
            tracing::debug!(
                handle = name,
                backlog = backlog.len(),
                "assigning unhandled backlog to new handle"
            );
            handle.adopt(backlog);
        }

        handles.insert(name.to_string(), handle);
    }

    /// Messages currently stored for this service: in flight on handles
    /// plus waiting in the unhandled store.
    pub fn stored_messages_count(&self) -> usize {
        let handles = self.state.handles.lock().expect("handle map lock poisoned");
        let in_flight: usize = handles.values().map(|handle| handle.pending_count()).sum();
        in_flight + self.state.unhandled.total_len()
    }

    /// Delete one stored message by id, wherever it currently sits.
    pub fn remove_stored_message(&self, uuid: &Uuid) -> bool {
        let handles = self.state.handles.lock().expect("handle map lock poisoned");
        if handles.values().any(|handle| handle.remove(uuid)) {
            return true;
        }
        self.state.unhandled.remove(uuid)
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        self.state.dead.store(true, Ordering::SeqCst);
        self.sweeper.stop();

        let handles: Vec<Arc<dyn Handle>> = {
            let mut map = self.state.handles.lock().expect("handle map lock poisoned");
            map.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            tracing::info!(handle = %handle.info(), "destroy handle");
            handle.kill();
        }

        self.state.running.store(false, Ordering::SeqCst);
        self.state.registry.terminate_all();
        self.state.registry.prune();
        tracing::info!(service = %self.state.info.name, "service finished");
    }
}
