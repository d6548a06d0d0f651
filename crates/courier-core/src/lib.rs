#![forbid(unsafe_code)]

//! Domain types for the courier dealer client.
//!
//! These are bounded and stable: the message model, endpoint identity,
//! the streamed response chunk taxonomy, and the error classes shared
//! across the transport boundary. No I/O, no threads.

pub mod chunk;
pub mod endpoint;
pub mod error;
pub mod message;

pub use chunk::{ChunkBody, ResponseChunk, RpcCode};
pub use endpoint::{Endpoint, ParseEndpointError, Transport};
pub use error::{ErrorCode, ResponseError};
pub use message::{Message, MessagePath, MessagePolicy};
