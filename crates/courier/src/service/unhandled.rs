//! Holding queues for messages whose handle does not exist yet.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

use uuid::Uuid;

use courier_core::Message;

/// Per-handle-name FIFO queues of messages awaiting a live handle.
///
/// Insertion order is preserved; it is the order in which a later-created
/// handle resumes sending.
pub(crate) struct UnhandledStore {
    queues: Mutex<HashMap<String, VecDeque<Message>>>,
}

impl UnhandledStore {
    pub(crate) fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Queue a message behind everything already waiting for its handle.
    pub(crate) fn append(&self, message: Message) {
        let mut queues = self.queues.lock().expect("unhandled store lock poisoned");
        queues
            .entry(message.path().handle.clone())
            .or_default()
            .push_back(message);
    }

    /// Remove and return the whole queue for a handle name.
    pub(crate) fn take(&self, handle_name: &str) -> VecDeque<Message> {
        let mut queues = self.queues.lock().expect("unhandled store lock poisoned");
        queues.remove(handle_name).unwrap_or_default()
    }

    /// Concatenate a drained handle cache onto the queue for its name,
    /// resetting delivery flags so a future handle retransmits from
    /// scratch.
    pub(crate) fn append_bulk(&self, handle_name: &str, drained: VecDeque<Message>) {
        if drained.is_empty() {
            return;
        }
        let mut queues = self.queues.lock().expect("unhandled store lock poisoned");
        let queue = queues.entry(handle_name.to_string()).or_default();
        for mut message in drained {
            message.reset_delivery();
            queue.push_back(message);
        }
    }

    pub(crate) fn total_len(&self) -> usize {
        let queues = self.queues.lock().expect("unhandled store lock poisoned");
        queues.values().map(VecDeque::len).sum()
    }

    /// Delete one stored message by id.
    pub(crate) fn remove(&self, uuid: &Uuid) -> bool {
        let mut queues = self.queues.lock().expect("unhandled store lock poisoned");
        for queue in queues.values_mut() {
            let before = queue.len();
            queue.retain(|message| message.uuid() != *uuid);
            if queue.len() != before {
                return true;
            }
        }
        false
    }

    /// Remove expired messages, invoking `on_expired` for each while the
    /// store lock is held. Queues with nothing expired are not touched.
    pub(crate) fn expire(&self, now: Instant, mut on_expired: impl FnMut(Message)) {
        let mut queues = self.queues.lock().expect("unhandled store lock poisoned");
        for queue in queues.values_mut() {
            if !queue.iter().any(|message| message.is_expired(now)) {
                continue;
            }
            let drained = std::mem::take(queue);
            for message in drained {
                if message.is_expired(now) {
                    on_expired(message);
                } else {
                    queue.push_back(message);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use courier_core::{MessagePath, MessagePolicy};

    fn message(handle: &str, policy: MessagePolicy) -> Message {
        Message::new(
            MessagePath::new("echo", handle),
            Bytes::from_static(b"p"),
            policy,
        )
    }

    #[test]
    fn take_returns_messages_in_submission_order() {
        let store = UnhandledStore::new();
        let uuids: Vec<Uuid> = (0..3)
            .map(|_| {
                let msg = message("workers", MessagePolicy::default());
                let uuid = msg.uuid();
                store.append(msg);
                uuid
            })
            .collect();

        let queue = store.take("workers");
        assert_eq!(
            queue.iter().map(Message::uuid).collect::<Vec<_>>(),
            uuids
        );
        assert!(store.take("workers").is_empty());
    }

    #[test]
    fn append_bulk_resets_flags_and_preserves_order() {
        let store = UnhandledStore::new();
        let waiting = message("workers", MessagePolicy::default());
        let waiting_uuid = waiting.uuid();
        store.append(waiting);

        let mut drained = VecDeque::new();
        let mut sent = message("workers", MessagePolicy::default());
        sent.mark_sent();
        sent.set_ack_received(true);
        let sent_uuid = sent.uuid();
        drained.push_back(sent);

        store.append_bulk("workers", drained);

        let queue = store.take("workers");
        assert_eq!(
            queue.iter().map(Message::uuid).collect::<Vec<_>>(),
            vec![waiting_uuid, sent_uuid]
        );
        let requeued = &queue[1];
        assert!(!requeued.is_sent());
        assert!(!requeued.ack_received());
    }

    #[test]
    fn remove_deletes_one_message_by_uuid() {
        let store = UnhandledStore::new();
        let msg = message("workers", MessagePolicy::default());
        let uuid = msg.uuid();
        store.append(msg);

        assert!(store.remove(&uuid));
        assert!(!store.remove(&uuid));
        assert_eq!(store.total_len(), 0);
    }

    #[test]
    fn expire_partitions_expired_from_waiting() {
        let store = UnhandledStore::new();
        let expired = message("workers", MessagePolicy::with_deadline(Duration::ZERO));
        let expired_uuid = expired.uuid();
        let waiting = message("workers", MessagePolicy::default());
        let waiting_uuid = waiting.uuid();
        store.append(expired);
        store.append(waiting);

        let mut failed = Vec::new();
        store.expire(Instant::now() + Duration::from_millis(1), |message| {
            failed.push(message.uuid());
        });

        assert_eq!(failed, vec![expired_uuid]);
        let queue = store.take("workers");
        assert_eq!(
            queue.iter().map(Message::uuid).collect::<Vec<_>>(),
            vec![waiting_uuid]
        );
    }

    #[test]
    fn expire_with_nothing_due_is_a_no_op() {
        let store = UnhandledStore::new();
        store.append(message("workers", MessagePolicy::with_deadline(Duration::from_secs(60))));
        store.append(message("workers", MessagePolicy::default()));

        for _ in 0..3 {
            let mut failed = 0;
            store.expire(Instant::now(), |_| failed += 1);
            assert_eq!(failed, 0);
            assert_eq!(store.total_len(), 2);
        }
    }
}
