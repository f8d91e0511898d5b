//! Transport seams between the scheduler and the wire clients.
//!
//! The scheduler only sees [`Transport`]. The two backends are built on
//! narrower traits ([`RemoteSession`], [`DocumentApi`]) so tests can mock
//! the wire without a network.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use folderpush_bot_api::{HttpReply, RetryPolicy};
use folderpush_transfer::{FileRecord, ProgressSink, TransportKind};
use tracing::debug;

use crate::error::TransportError;
use crate::types::Credentials;

/// Boxed future returned by the transport traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Long-lived authenticated session with the streaming service.
///
/// One session is shared by every streaming task in a run, so
/// implementations must accept concurrent `upload` calls.
pub trait RemoteSession: Send + Sync {
    fn upload<'a>(
        &'a self,
        destination: &'a str,
        file_path: &'a Path,
        chunk_size: usize,
        progress: Arc<dyn ProgressSink>,
    ) -> BoxFuture<'a, Result<(), TransportError>>;

    fn disconnect(&self) -> BoxFuture<'_, Result<(), TransportError>>;
}

/// Opens a [`RemoteSession`].
pub trait Connector: Send + Sync {
    fn connect<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<Arc<dyn RemoteSession>, TransportError>>;
}

/// One multipart document upload. Makes exactly one HTTP attempt.
pub trait DocumentApi: Send + Sync {
    fn send_document<'a>(
        &'a self,
        destination: &'a str,
        file_path: &'a Path,
        progress: Arc<dyn ProgressSink>,
    ) -> BoxFuture<'a, Result<HttpReply, TransportError>>;
}

/// What the scheduler runs for each task.
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Moves `file` to the destination. Returns the bytes delivered.
    fn upload<'a>(
        &'a self,
        file: &'a FileRecord,
        progress: Arc<dyn ProgressSink>,
    ) -> BoxFuture<'a, Result<u64, TransportError>>;
}

// ---------------------------------------------------------------------------
// Streaming backend
// ---------------------------------------------------------------------------

/// Chunked uploads over the shared streaming session.
pub struct StreamingTransport {
    session: Arc<dyn RemoteSession>,
    destination: String,
    chunk_size: usize,
}

impl StreamingTransport {
    pub fn new(
        session: Arc<dyn RemoteSession>,
        destination: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            session,
            destination: destination.into(),
            chunk_size,
        }
    }
}

impl Transport for StreamingTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Streaming
    }

    fn upload<'a>(
        &'a self,
        file: &'a FileRecord,
        progress: Arc<dyn ProgressSink>,
    ) -> BoxFuture<'a, Result<u64, TransportError>> {
        Box::pin(async move {
            self.session
                .upload(&self.destination, &file.path, self.chunk_size, progress)
                .await?;
            Ok(file.size_bytes)
        })
    }
}

// ---------------------------------------------------------------------------
// Multipart backend
// ---------------------------------------------------------------------------

/// HTTP document uploads with bounded retry on transient server errors.
pub struct MultipartTransport {
    api: Arc<dyn DocumentApi>,
    destination: String,
    policy: RetryPolicy,
}

impl MultipartTransport {
    pub fn new(api: Arc<dyn DocumentApi>, destination: impl Into<String>) -> Self {
        Self {
            api,
            destination: destination.into(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Transport for MultipartTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Multipart
    }

    fn upload<'a>(
        &'a self,
        file: &'a FileRecord,
        progress: Arc<dyn ProgressSink>,
    ) -> BoxFuture<'a, Result<u64, TransportError>> {
        let api = &self.api;
        let destination = self.destination.as_str();
        Box::pin(async move {
            let (reply, attempts) = self
                .policy
                .execute(move |attempt| {
                    debug!(path = %file.path.display(), attempt, "multipart attempt");
                    api.send_document(destination, &file.path, progress.clone())
                })
                .await?;

            if reply.is_success() {
                Ok(file.size_bytes)
            } else if self.policy.is_retryable(reply.status) {
                Err(TransportError::RetryExhausted {
                    attempts,
                    last_status: reply.status,
                })
            } else {
                Err(TransportError::Rejected {
                    status: reply.status,
                    body: reply.body,
                })
            }
        })
    }
}

// ---------------------------------------------------------------------------
// TransportSet
// ---------------------------------------------------------------------------

/// The transports available to a run, at most one per kind.
#[derive(Clone, Default)]
pub struct TransportSet {
    streaming: Option<Arc<dyn Transport>>,
    multipart: Option<Arc<dyn Transport>>,
}

impl TransportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `transport` under its own kind, replacing any previous one.
    pub fn with(mut self, transport: Arc<dyn Transport>) -> Self {
        match transport.kind() {
            TransportKind::Streaming => self.streaming = Some(transport),
            TransportKind::Multipart => self.multipart = Some(transport),
        }
        self
    }

    pub fn get(&self, kind: TransportKind) -> Option<Arc<dyn Transport>> {
        match kind {
            TransportKind::Streaming => self.streaming.clone(),
            TransportKind::Multipart => self.multipart.clone(),
        }
    }
}
