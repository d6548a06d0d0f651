#![forbid(unsafe_code)]

//! Client-side runtime of an asynchronous RPC dealer.
//!
//! Applications submit opaque payloads addressed to named remote
//! services and read streamed response chunks back through a blocking
//! [`Receiver`]. The runtime routes each submission to a named handle (a
//! logical worker pool) inside the service, parks messages whose handle
//! does not exist yet, matches response chunks to receivers by UUID, and
//! fails undeliverable messages once their deadline passes.
//!
//! The transport behind a handle and the discovery layer that reports
//! handle/endpoint snapshots are external collaborators, reached through
//! the [`Handle`]/[`HandleFactory`] traits and
//! [`Service::refresh_handles`] respectively.

pub mod config;
pub mod dealer;
pub mod discovery;
pub mod error;
pub mod handle;
pub mod service;
pub mod telemetry;

pub use courier_core as core;

pub use config::{Config, ConfigError, ServiceConfig};
pub use dealer::Dealer;
pub use discovery::{parse_hosts_list, EndpointSnapshot, HostsFetcher};
pub use error::DealerError;
pub use handle::{ChunkCallback, Handle, HandleFactory, HandleInfo};
pub use service::{Receiver, Reply, Service, ServiceInfo, ServiceTuning};

// Core types most callers need, re-exported at the crate root.
pub use courier_core::{
    ChunkBody, Endpoint, ErrorCode, Message, MessagePath, MessagePolicy, ResponseChunk,
    ResponseError, Transport,
};

pub type Result<T> = std::result::Result<T, DealerError>;
