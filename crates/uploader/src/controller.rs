//! One end-to-end upload run.

use std::path::Path;
use std::sync::Arc;

use folderpush_ledger::{ErrorLog, Ledger};
use folderpush_transfer::{NoopReporter, ProgressReporter, TaskId};
use tracing::{error, info};

use crate::error::UploadError;
use crate::scanner::enumerate;
use crate::scheduler::Scheduler;
use crate::selector::select;
use crate::transport::{
    Connector, DocumentApi, MultipartTransport, RemoteSession, StreamingTransport, TransportSet,
};
use crate::types::{Credentials, RunSummary, UploadMode, UploadTask};

/// Per-run knobs taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Remote destination (chat / group identifier).
    pub destination: String,
    pub mode: UploadMode,
    /// Upper bound on concurrently active uploads.
    pub concurrency: usize,
    /// Streaming chunk size in bytes.
    pub chunk_size: usize,
}

/// Drives connect, scan, filter, schedule and disconnect for one root.
pub struct RunController {
    connector: Arc<dyn Connector>,
    credentials: Credentials,
    settings: RunSettings,
    ledger: Arc<Ledger>,
    error_log: ErrorLog,
    document_api: Option<Arc<dyn DocumentApi>>,
    reporter: Arc<dyn ProgressReporter>,
}

impl RunController {
    pub fn new(
        connector: Arc<dyn Connector>,
        credentials: Credentials,
        settings: RunSettings,
        ledger: Ledger,
        error_log: ErrorLog,
    ) -> Self {
        Self {
            connector,
            credentials,
            settings,
            ledger: Arc::new(ledger),
            error_log,
            document_api: None,
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Enables the multipart backend.
    pub fn with_document_api(mut self, api: Arc<dyn DocumentApi>) -> Self {
        self.document_api = Some(api);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Uploads every file under `root` not already in the ledger.
    ///
    /// Connect and disconnect failures are fatal. Per-file failures only
    /// show up in the summary and the error log. The session is
    /// disconnected even when enumeration fails.
    pub async fn run(&self, root: &Path) -> Result<RunSummary, UploadError> {
        let session = self
            .connector
            .connect(&self.credentials)
            .await
            .map_err(|e| UploadError::Session(format!("connect failed: {e}")))?;
        info!(mode = %self.settings.mode, "session connected");

        let result = self.run_session(session.clone(), root).await;

        match (result, session.disconnect().await) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(e)) => Err(UploadError::Session(format!("disconnect failed: {e}"))),
            (Err(run_err), Err(e)) => {
                error!(error = %e, "disconnect failed after aborted run");
                Err(run_err)
            }
            (Err(run_err), Ok(())) => Err(run_err),
        }
    }

    async fn run_session(
        &self,
        session: Arc<dyn RemoteSession>,
        root: &Path,
    ) -> Result<RunSummary, UploadError> {
        let root = root
            .canonicalize()
            .map_err(|source| UploadError::Enumeration {
                path: root.to_path_buf(),
                source,
            })?;
        let files = enumerate(&root)?;
        info!(root = %root.display(), files = files.len(), "scan complete");

        let mut summary = RunSummary {
            tasks_considered: files.len(),
            ..RunSummary::default()
        };

        let mut tasks = Vec::new();
        for file in files {
            if self.ledger.contains(&file.ledger_key()) {
                info!(path = %file.path.display(), "already uploaded, skipping");
                summary.tasks_skipped += 1;
                continue;
            }
            let backend = select(file.size_bytes, self.settings.mode);
            tasks.push(UploadTask {
                id: TaskId(tasks.len() as u64 + 1),
                file,
                backend,
            });
        }

        let scheduler = Scheduler::new(
            self.transports(session),
            self.ledger.clone(),
            self.error_log.clone(),
            self.reporter.clone(),
        );
        let outcome = scheduler.run(tasks, self.settings.concurrency).await;
        summary.tasks_succeeded = outcome.tasks_succeeded;
        summary.tasks_failed = outcome.tasks_failed;

        info!("{summary}");
        Ok(summary)
    }

    fn transports(&self, session: Arc<dyn RemoteSession>) -> TransportSet {
        let mut set = TransportSet::new().with(Arc::new(StreamingTransport::new(
            session,
            self.settings.destination.clone(),
            self.settings.chunk_size,
        )));
        if let Some(api) = &self.document_api {
            set = set.with(Arc::new(MultipartTransport::new(
                api.clone(),
                self.settings.destination.clone(),
            )));
        }
        set
    }
}
