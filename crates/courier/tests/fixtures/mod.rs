//! Scripted transport fixtures for routing tests.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use uuid::Uuid;

use courier::core::{Endpoint, Message, ResponseChunk};
use courier::{ChunkCallback, Handle, HandleFactory, HandleInfo};

/// Transport stand-in: records everything the router hands it and lets
/// tests emit response chunks through the registered callback.
pub struct TestHandle {
    info: HandleInfo,
    on_chunk: ChunkCallback,
    cache: Mutex<VecDeque<Message>>,
    endpoints: Mutex<BTreeSet<Endpoint>>,
    adopted_flags: Mutex<Vec<(Uuid, bool, bool)>>,
    killed: AtomicBool,
}

impl TestHandle {
    fn new(info: HandleInfo, endpoints: &BTreeSet<Endpoint>, on_chunk: ChunkCallback) -> Self {
        Self {
            info,
            on_chunk,
            cache: Mutex::new(VecDeque::new()),
            endpoints: Mutex::new(endpoints.clone()),
            adopted_flags: Mutex::new(Vec::new()),
            killed: AtomicBool::new(false),
        }
    }

    /// Emit a response chunk as if it arrived from the wire.
    pub fn emit(&self, chunk: ResponseChunk) {
        (self.on_chunk)(chunk);
    }

    /// UUIDs of every message handed to this proxy, in arrival order.
    pub fn enqueued_order(&self) -> Vec<Uuid> {
        self.cache.lock().unwrap().iter().map(Message::uuid).collect()
    }

    pub fn payloads(&self) -> Vec<Bytes> {
        self.cache
            .lock()
            .unwrap()
            .iter()
            .map(|message| message.payload().clone())
            .collect()
    }

    /// `(uuid, sent, ack_received)` for each adopted backlog message, as
    /// seen at hand-over time.
    pub fn adopted_flags(&self) -> Vec<(Uuid, bool, bool)> {
        self.adopted_flags.lock().unwrap().clone()
    }

    pub fn endpoints(&self) -> BTreeSet<Endpoint> {
        self.endpoints.lock().unwrap().clone()
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

impl Handle for TestHandle {
    fn info(&self) -> &HandleInfo {
        &self.info
    }

    fn enqueue(&self, mut message: Message) {
        // Simulate immediate transmission.
        message.mark_sent();
        self.cache.lock().unwrap().push_back(message);
    }

    fn adopt(&self, backlog: VecDeque<Message>) {
        let mut cache = self.cache.lock().unwrap();
        let mut flags = self.adopted_flags.lock().unwrap();
        for message in backlog {
            flags.push((message.uuid(), message.is_sent(), message.ack_received()));
            cache.push_back(message);
        }
    }

    fn update_endpoints(&self, endpoints: &BTreeSet<Endpoint>) {
        *self.endpoints.lock().unwrap() = endpoints.clone();
    }

    fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
    }

    fn drain(&self) -> VecDeque<Message> {
        let mut cache = std::mem::take(&mut *self.cache.lock().unwrap());
        for message in &mut cache {
            message.reset_delivery();
        }
        cache
    }

    fn pending_count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    fn remove(&self, uuid: &Uuid) -> bool {
        let mut cache = self.cache.lock().unwrap();
        let before = cache.len();
        cache.retain(|message| message.uuid() != *uuid);
        cache.len() != before
    }
}

/// Factory keeping every proxy it creates reachable for assertions.
#[derive(Default)]
pub struct TestFactory {
    created: Mutex<Vec<Arc<TestHandle>>>,
}

impl TestFactory {
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// The most recently created proxy for a handle name.
    pub fn latest(&self, name: &str) -> Arc<TestHandle> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|handle| handle.info.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no handle created for `{name}`"))
    }
}

impl HandleFactory for TestFactory {
    fn create(
        &self,
        info: HandleInfo,
        endpoints: &BTreeSet<Endpoint>,
        on_chunk: ChunkCallback,
    ) -> Arc<dyn Handle> {
        let handle = Arc::new(TestHandle::new(info, endpoints, on_chunk));
        self.created.lock().unwrap().push(Arc::clone(&handle));
        handle
    }
}
