//! Upload error types.

use std::path::PathBuf;

use folderpush_bot_api::BotApiError;
use folderpush_stream_client::StreamError;
use folderpush_transfer::TransportKind;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("cannot enumerate {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session error: {0}")]
    Session(String),
}

/// Errors from a single upload attempt. Recorded per task; never fatal.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream error: {0}")]
    Stream(StreamError),

    #[error("HTTP error: {0}")]
    Http(#[from] BotApiError),

    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("gave up after {attempts} attempts, last status {last_status}")]
    RetryExhausted { attempts: u32, last_status: u16 },

    #[error("remote error {code}: {message}")]
    Remote { code: i32, message: String },

    #[error("no transport configured for {0}")]
    NoTransport(TransportKind),
}

impl From<StreamError> for TransportError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Remote { code, message } => TransportError::Remote { code, message },
            StreamError::Io(e) => TransportError::Io(e),
            other => TransportError::Stream(other),
        }
    }
}
