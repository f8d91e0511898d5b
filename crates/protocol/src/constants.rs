use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Time to wait for any incoming message before the connection is
/// considered dead.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// How often the client sends keepalive pings.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(5);

/// Maximum message size in bytes (64 MiB).
///
/// Must be larger than the biggest chunk plus its JSON header.
pub const WS_MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Timeout for text request/response operations.
pub const WS_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for binary chunk uploads.
pub const WS_BINARY_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Default streaming chunk size: 8 MiB.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Largest chunk that still fits a frame, leaving 64 KiB for the header.
pub const MAX_STREAM_CHUNK_SIZE: usize = WS_MAX_MESSAGE_SIZE - 64 * 1024;

/// Binary frames start with the header length as a big-endian `u32`,
/// followed by the JSON header and then the raw chunk bytes.
pub const BINARY_HEADER_LEN_BYTES: usize = 4;

/// `type` field of a text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    // Session
    Authenticate,
    AuthOk,
    Goodbye,

    // File transfer
    BeginFile,
    FileAccepted,
    ChunkAck,
    CompleteFile,
    FileCompleted,

    // Keepalive / errors
    Ping,
    Pong,
    Error,
}

pub const WS_ERR_CODE_BAD_REQUEST: i32 = 400;
pub const WS_ERR_CODE_UNAUTHORIZED: i32 = 401;
pub const WS_ERR_CODE_TOO_LARGE: i32 = 413;
pub const WS_ERR_CODE_INTERNAL: i32 = 500;
