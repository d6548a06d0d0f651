//! Streamed response chunks crossing the transport boundary.

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{ErrorCode, ResponseError};

/// Wire discriminator for one response chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RpcCode {
    /// One payload piece follows.
    Chunk,
    /// Clean end of stream.
    Choke,
    /// Terminal failure.
    Error,
}

impl RpcCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            RpcCode::Chunk => "chunk",
            RpcCode::Choke => "choke",
            RpcCode::Error => "error",
        }
    }
}

/// Body of one streamed response chunk.
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkBody {
    Data(Bytes),
    Choke,
    Error(ResponseError),
}

impl ChunkBody {
    pub fn rpc_code(&self) -> RpcCode {
        match self {
            ChunkBody::Data(_) => RpcCode::Chunk,
            ChunkBody::Choke => RpcCode::Choke,
            ChunkBody::Error(_) => RpcCode::Error,
        }
    }
}

/// One chunk of a streamed response, addressed by message UUID.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseChunk {
    pub uuid: Uuid,
    pub body: ChunkBody,
}

impl ResponseChunk {
    pub fn data(uuid: Uuid, payload: impl Into<Bytes>) -> Self {
        Self {
            uuid,
            body: ChunkBody::Data(payload.into()),
        }
    }

    pub fn choke(uuid: Uuid) -> Self {
        Self {
            uuid,
            body: ChunkBody::Choke,
        }
    }

    pub fn error(uuid: Uuid, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            uuid,
            body: ChunkBody::Error(ResponseError::new(code, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_body_maps_to_rpc_code() {
        let uuid = Uuid::new_v4();
        assert_eq!(ResponseChunk::data(uuid, "p").body.rpc_code(), RpcCode::Chunk);
        assert_eq!(ResponseChunk::choke(uuid).body.rpc_code(), RpcCode::Choke);
        assert_eq!(
            ResponseChunk::error(uuid, ErrorCode::Server, "boom").body.rpc_code(),
            RpcCode::Error
        );
    }
}
