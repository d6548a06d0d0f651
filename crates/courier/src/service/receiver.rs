//! Consumer-side receiver for one message's streamed response.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use uuid::Uuid;

use courier_core::{ChunkBody, MessagePath, ResponseError};

/// What one call to [`Receiver::get`] produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// The oldest buffered chunk.
    Chunk(Bytes),
    /// The stream terminated cleanly and every chunk has been consumed.
    End,
    /// The wait expired with nothing buffered; the message stays live.
    TimedOut,
}

#[derive(Default)]
struct ReceiverState {
    chunks: VecDeque<Bytes>,
    finished: bool,
    error: Option<ResponseError>,
}

/// Shared half of a receiver. The router delivers into it from transport
/// threads; the consumer blocks on it through [`Receiver`].
pub(crate) struct ReceiverShared {
    uuid: Uuid,
    path: MessagePath,
    state: Mutex<ReceiverState>,
    available: Condvar,
}

impl ReceiverShared {
    pub(crate) fn new(uuid: Uuid, path: MessagePath) -> Self {
        Self {
            uuid,
            path,
            state: Mutex::new(ReceiverState::default()),
            available: Condvar::new(),
        }
    }

    pub(crate) fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Classify and absorb one chunk, then wake a blocked consumer.
    ///
    /// Anything delivered after the terminal transition is dropped.
    pub(crate) fn deliver(&self, body: ChunkBody) {
        let mut state = self.state.lock().expect("receiver state lock poisoned");
        if state.finished {
            return;
        }
        match body {
            ChunkBody::Data(payload) => state.chunks.push_back(payload),
            ChunkBody::Choke => state.finished = true,
            ChunkBody::Error(error) => {
                state.error = Some(error);
                state.finished = true;
            }
        }
        drop(state);
        self.available.notify_one();
    }

    /// Terminal transition without a chunk. Used at service teardown so a
    /// blocked consumer observes the end of the stream.
    pub(crate) fn finish(&self) {
        let mut state = self.state.lock().expect("receiver state lock poisoned");
        state.finished = true;
        drop(state);
        self.available.notify_all();
    }
}

/// Blocking consumer endpoint for one message.
///
/// The consumer's receiver is the owning reference: dropping it cancels
/// interest, and later chunks for the message are discarded by the
/// router.
pub struct Receiver {
    shared: Arc<ReceiverShared>,
}

impl Receiver {
    pub(crate) fn new(shared: Arc<ReceiverShared>) -> Self {
        Self { shared }
    }

    pub fn uuid(&self) -> Uuid {
        self.shared.uuid
    }

    pub fn path(&self) -> &MessagePath {
        &self.shared.path
    }

    /// Wait for the next chunk.
    ///
    /// `None` waits indefinitely. Once an error has terminated the stream
    /// the captured error is returned exactly once, after all buffered
    /// chunks have been consumed; subsequent calls yield [`Reply::End`].
    pub fn get(&self, timeout: Option<Duration>) -> Result<Reply, ResponseError> {
        let wait_until = timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.shared.state.lock().expect("receiver state lock poisoned");
        loop {
            if let Some(payload) = state.chunks.pop_front() {
                return Ok(Reply::Chunk(payload));
            }
            if state.finished {
                if let Some(error) = state.error.take() {
                    return Err(error);
                }
                return Ok(Reply::End);
            }
            state = match wait_until {
                None => self
                    .shared
                    .available
                    .wait(state)
                    .expect("receiver state lock poisoned"),
                Some(wait_until) => {
                    let now = Instant::now();
                    if now >= wait_until {
                        return Ok(Reply::TimedOut);
                    }
                    let (state, _) = self
                        .shared
                        .available
                        .wait_timeout(state, wait_until - now)
                        .expect("receiver state lock poisoned");
                    state
                }
            };
        }
    }
}
