//! WebSocket client for the streaming upload service.
//!
//! One [`StreamClient`] is opened per run and shared by every streaming
//! upload task. Outbound frames go through a single write pump; responses
//! are routed back to callers by request id, so many uploads can be in
//! flight on the same connection.

mod client;
mod error;
mod pumps;
mod upload;

pub use client::{PendingMap, StreamClient};
pub use error::StreamError;
pub use upload::{decode_chunk_frame, encode_chunk_frame};
