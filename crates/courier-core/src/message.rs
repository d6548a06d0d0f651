//! Message model: routing path, delivery policy, and the cached message.

use std::fmt;
use std::time::{Duration, Instant};

use bytes::Bytes;
use uuid::Uuid;

/// Routing coordinates of a message: which service, which worker pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessagePath {
    pub service: String,
    pub handle: String,
}

impl MessagePath {
    pub fn new(service: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            handle: handle.into(),
        }
    }
}

impl fmt::Display for MessagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.handle)
    }
}

/// Delivery policy attached to a message at submission time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessagePolicy {
    /// Fail the message with a deadline error if it is still waiting for
    /// a handle after this long.
    pub deadline: Option<Duration>,
}

impl MessagePolicy {
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }
}

/// One client submission: an immutable header plus an opaque payload.
///
/// The `sent` and `ack_received` flags belong to the transport once the
/// message has been enqueued onto a handle; the router only ever touches
/// them through [`Message::reset_delivery`] when a message is returned to
/// the unhandled store.
#[derive(Clone, Debug)]
pub struct Message {
    uuid: Uuid,
    path: MessagePath,
    payload: Bytes,
    enqueued_at: Instant,
    sent_at: Option<Instant>,
    expires_at: Option<Instant>,
    sent: bool,
    ack_received: bool,
}

impl Message {
    pub fn new(path: MessagePath, payload: Bytes, policy: MessagePolicy) -> Self {
        let now = Instant::now();
        Self {
            uuid: Uuid::new_v4(),
            path,
            payload,
            enqueued_at: now,
            sent_at: None,
            expires_at: policy.deadline.map(|deadline| now + deadline),
            sent: false,
            ack_received: false,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn path(&self) -> &MessagePath {
        &self.path
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    pub fn sent_at(&self) -> Option<Instant> {
        self.sent_at
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Transport-side: the message went out on the wire.
    pub fn mark_sent(&mut self) {
        self.sent = true;
        self.sent_at = Some(Instant::now());
    }

    pub fn ack_received(&self) -> bool {
        self.ack_received
    }

    /// Transport-side: the remote acknowledged receipt.
    pub fn set_ack_received(&mut self, ack_received: bool) {
        self.ack_received = ack_received;
    }

    pub fn has_deadline(&self) -> bool {
        self.expires_at.is_some()
    }

    /// True once the policy deadline has passed. Messages without a
    /// deadline never expire.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Forget any delivery progress so a fresh handle retransmits from
    /// scratch.
    pub fn reset_delivery(&mut self) {
        self.sent = false;
        self.ack_received = false;
        self.sent_at = None;
    }
}
