//! Chunked file reading and progress tracking for uploads.
//!
//! Holds the value types shared by every other crate: what a file is
//! ([`FileRecord`]), which backend moves it ([`TransportKind`]) and how
//! bytes-on-the-wire are reported ([`ProgressSink`], [`ProgressReporter`]).

mod chunked;
mod progress;
mod types;

pub use chunked::{ChunkReader, checksum_bytes};
pub use progress::{NoopReporter, ProgressReporter, ProgressSink, TaskProgress};
pub use types::{Chunk, FileRecord, TaskId, TransportKind, bytes_to_mb};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file changed while reading: expected {expected} bytes, found {actual}")]
    SizeChanged { expected: u64, actual: u64 },
}
