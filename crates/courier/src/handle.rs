//! Handle proxy contract: the seam between the router and the transport.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use courier_core::{Endpoint, Message, ResponseChunk};

/// Identity of one handle within a service.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HandleInfo {
    pub name: String,
    pub service: String,
    pub app: String,
}

impl fmt::Display for HandleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}.{}.{}]", self.service, self.app, self.name)
    }
}

/// Invoked from transport threads whenever a response chunk arrives.
/// Must be reentrant-safe and cheap from the proxy's point of view.
pub type ChunkCallback = Arc<dyn Fn(ResponseChunk) + Send + Sync>;

/// Transport-side proxy for one handle.
///
/// The router drives proxies exclusively through this trait; the socket
/// machinery behind it is the transport's business. `kill` must be
/// idempotent and must guarantee that no chunk callback fires after it
/// returns.
pub trait Handle: Send + Sync {
    fn info(&self) -> &HandleInfo;

    /// Accept a message for onward delivery. The proxy owns it until a
    /// terminal chunk is produced or the proxy is drained.
    fn enqueue(&self, message: Message);

    /// Hand over a backlog as the proxy's initial message cache, in order.
    fn adopt(&self, backlog: VecDeque<Message>);

    /// Replace the endpoint pool. In-flight messages may be retried
    /// against the new endpoints.
    fn update_endpoints(&self, endpoints: &BTreeSet<Endpoint>);

    /// Terminate all proxy activity.
    fn kill(&self);

    /// Remove and return every message still held, in submission order,
    /// with delivery flags reset.
    fn drain(&self) -> VecDeque<Message>;

    /// Messages currently held: in flight or awaiting acknowledgement.
    fn pending_count(&self) -> usize;

    /// Remove one held message by id.
    fn remove(&self, uuid: &Uuid) -> bool;
}

/// Creates transport proxies for newly discovered handles.
///
/// The chunk callback is supplied at construction, so a proxy is able to
/// deliver responses before any backlog is adopted.
pub trait HandleFactory: Send + Sync {
    fn create(
        &self,
        info: HandleInfo,
        endpoints: &BTreeSet<Endpoint>,
        on_chunk: ChunkCallback,
    ) -> Arc<dyn Handle>;
}
