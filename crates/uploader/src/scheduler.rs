//! Concurrency-bounded task execution.
//!
//! Admission goes through a FIFO-fair [`Semaphore`]: a permit is taken in
//! submission order before a task is spawned and dropped when the task
//! ends, whatever the outcome. Each task records its own result in the
//! ledger or the error log as soon as it finishes.

use std::path::PathBuf;
use std::sync::Arc;

use folderpush_ledger::{ErrorLog, ErrorRecord, Ledger, LedgerEntry};
use folderpush_transfer::{ProgressReporter, TaskId, TaskProgress, TransportKind};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, warn};

use crate::error::TransportError;
use crate::transport::{Transport, TransportSet};
use crate::types::{RunSummary, TaskOutcome, UploadTask};

/// Runs upload tasks and records their outcomes.
pub struct Scheduler {
    transports: TransportSet,
    ledger: Arc<Ledger>,
    error_log: ErrorLog,
    reporter: Arc<dyn ProgressReporter>,
}

impl Scheduler {
    pub fn new(
        transports: TransportSet,
        ledger: Arc<Ledger>,
        error_log: ErrorLog,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            transports,
            ledger,
            error_log,
            reporter,
        }
    }

    /// Runs every task with at most `limit` active at once.
    ///
    /// Returns after all tasks reached a terminal state. Only the
    /// succeeded/failed counters are filled in.
    pub async fn run(&self, tasks: Vec<UploadTask>, limit: usize) -> RunSummary {
        self.run_with_outcomes(tasks, limit).await.0
    }

    /// Like [`run`](Self::run), also returning one outcome per task in
    /// submission order.
    pub async fn run_with_outcomes(
        &self,
        tasks: Vec<UploadTask>,
        limit: usize,
    ) -> (RunSummary, Vec<TaskOutcome>) {
        let limit = if limit == 0 {
            warn!("concurrency limit of 0 clamped to 1");
            1
        } else {
            limit
        };
        let gate = Arc::new(Semaphore::new(limit));

        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let permit = match gate.clone().acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    // The gate is never closed; keep the task accounted for anyway.
                    let outcome = self.fail_unstarted(&task, format!("admission failed: {e}"));
                    handles.push(Pending::Done(outcome));
                    continue;
                }
            };

            let ctx = TaskContext {
                transport: self.transports.get(task.backend),
                ledger: self.ledger.clone(),
                error_log: self.error_log.clone(),
                reporter: self.reporter.clone(),
            };
            let meta = (task.id, task.file.path.clone(), task.backend);
            let handle = tokio::spawn(execute(task, ctx, permit));
            handles.push(Pending::Running(meta, handle));
        }

        let mut summary = RunSummary::default();
        let mut outcomes = Vec::with_capacity(handles.len());
        for pending in handles {
            let outcome = match pending {
                Pending::Done(outcome) => outcome,
                Pending::Running((task_id, path, backend), handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let message = format!("task aborted: {e}");
                        error!(task = %task_id, path = %path.display(), "{message}");
                        record_failure(&self.error_log, &path, &message);
                        self.reporter.task_finished(task_id, false);
                        TaskOutcome {
                            task_id,
                            path,
                            backend,
                            result: Err(message),
                        }
                    }
                },
            };

            if outcome.is_success() {
                summary.tasks_succeeded += 1;
            } else {
                summary.tasks_failed += 1;
            }
            outcomes.push(outcome);
        }

        (summary, outcomes)
    }

    fn fail_unstarted(&self, task: &UploadTask, message: String) -> TaskOutcome {
        error!(task = %task.id, path = %task.file.path.display(), "{message}");
        record_failure(&self.error_log, &task.file.path, &message);
        TaskOutcome {
            task_id: task.id,
            path: task.file.path.clone(),
            backend: task.backend,
            result: Err(message),
        }
    }
}

enum Pending {
    Running(
        (TaskId, PathBuf, TransportKind),
        tokio::task::JoinHandle<TaskOutcome>,
    ),
    Done(TaskOutcome),
}

struct TaskContext {
    transport: Option<Arc<dyn Transport>>,
    ledger: Arc<Ledger>,
    error_log: ErrorLog,
    reporter: Arc<dyn ProgressReporter>,
}

async fn execute(task: UploadTask, ctx: TaskContext, permit: OwnedSemaphorePermit) -> TaskOutcome {
    let _permit = permit;
    let UploadTask { id, file, backend } = task;

    ctx.reporter.task_started(id, &file);
    let progress = Arc::new(TaskProgress::new(id, ctx.reporter.clone()));

    let result = match &ctx.transport {
        Some(transport) => transport.upload(&file, progress).await,
        None => Err(TransportError::NoTransport(backend)),
    };

    let result = match result {
        Ok(bytes) => {
            if let Err(e) = ctx.ledger.append(&LedgerEntry::for_upload(&file, backend)) {
                error!(task = %id, path = %file.path.display(), error = %e, "uploaded but not recorded in ledger");
            }
            info!(task = %id, path = %file.path.display(), backend = %backend, bytes, "upload succeeded");
            ctx.reporter.task_finished(id, true);
            Ok(bytes)
        }
        Err(e) => {
            let message = e.to_string();
            error!(task = %id, path = %file.path.display(), backend = %backend, error = %message, "upload failed");
            record_failure(&ctx.error_log, &file.path, &message);
            ctx.reporter.task_finished(id, false);
            Err(message)
        }
    };

    TaskOutcome {
        task_id: id,
        path: file.path,
        backend,
        result,
    }
}

fn record_failure(error_log: &ErrorLog, path: &std::path::Path, message: &str) {
    let record = ErrorRecord::new(path.to_string_lossy(), message);
    if let Err(e) = error_log.append(&record) {
        error!(path = %path.display(), error = %e, "could not write error log");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use folderpush_transfer::{FileRecord, NoopReporter, ProgressSink};
    use tempfile::TempDir;

    use crate::transport::BoxFuture;

    /// How a mock transport treats one file, keyed by file name.
    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed { delay_ms: u64 },
        Fail,
        Panic,
        Hang,
    }

    /// Per-task totals as the terminal would see them.
    #[derive(Default)]
    struct RecordingReporter {
        names: Mutex<HashMap<TaskId, String>>,
        bytes: Mutex<HashMap<TaskId, u64>>,
        finished: Mutex<HashMap<TaskId, bool>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn task_started(&self, id: TaskId, file: &FileRecord) {
            self.names.lock().unwrap().insert(id, file.file_name());
        }
        fn on_bytes(&self, id: TaskId, delta: u64) {
            *self.bytes.lock().unwrap().entry(id).or_default() += delta;
        }
        fn task_finished(&self, id: TaskId, success: bool) {
            self.finished.lock().unwrap().insert(id, success);
        }
    }

    struct MockTransport {
        kind: TransportKind,
        behaviors: HashMap<String, Behavior>,
        active: AtomicUsize,
        max_active: AtomicUsize,
        started: Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn new(kind: TransportKind, behaviors: &[(&str, Behavior)]) -> Self {
            Self {
                kind,
                behaviors: behaviors
                    .iter()
                    .map(|(n, b)| (n.to_string(), *b))
                    .collect(),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                started: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for MockTransport {
        fn kind(&self) -> TransportKind {
            self.kind
        }

        fn upload<'a>(
            &'a self,
            file: &'a FileRecord,
            progress: Arc<dyn ProgressSink>,
        ) -> BoxFuture<'a, Result<u64, TransportError>> {
            Box::pin(async move {
                let name = file.file_name();
                self.started.lock().unwrap().push(name.clone());
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_active.fetch_max(now, Ordering::SeqCst);

                let behavior = self
                    .behaviors
                    .get(&name)
                    .copied()
                    .unwrap_or(Behavior::Succeed { delay_ms: 0 });
                let result = match behavior {
                    Behavior::Succeed { delay_ms } => {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        progress.update(file.size_bytes);
                        Ok(file.size_bytes)
                    }
                    Behavior::Fail => Err(TransportError::Rejected {
                        status: 400,
                        body: "bad request".into(),
                    }),
                    Behavior::Panic => panic!("transport blew up"),
                    Behavior::Hang => std::future::pending().await,
                };

                self.active.fetch_sub(1, Ordering::SeqCst);
                result
            })
        }
    }

    struct Fixture {
        dir: TempDir,
        ledger_path: PathBuf,
        error_path: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let ledger_path = dir.path().join("upload.log");
            let error_path = dir.path().join("error.log");
            Self {
                dir,
                ledger_path,
                error_path,
            }
        }

        fn scheduler(
            &self,
            transports: TransportSet,
            reporter: Arc<dyn ProgressReporter>,
        ) -> Scheduler {
            Scheduler::new(
                transports,
                Arc::new(Ledger::load(&self.ledger_path).unwrap()),
                ErrorLog::new(&self.error_path),
                reporter,
            )
        }

        fn task(&self, id: u64, name: &str, backend: TransportKind) -> UploadTask {
            UploadTask {
                id: TaskId(id),
                file: FileRecord::new(self.dir.path().join(name), 100),
                backend,
            }
        }

        fn ledger_lines(&self) -> Vec<String> {
            read_lines(&self.ledger_path)
        }

        fn error_lines(&self) -> Vec<String> {
            read_lines(&self.error_path)
        }
    }

    fn read_lines(path: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn success_appends_ledger_and_counts() {
        let fx = Fixture::new();
        let transport = Arc::new(MockTransport::new(TransportKind::Streaming, &[]));
        let sched = fx.scheduler(TransportSet::new().with(transport), Arc::new(NoopReporter));

        let tasks = vec![
            fx.task(1, "a.txt", TransportKind::Streaming),
            fx.task(2, "b.txt", TransportKind::Streaming),
        ];
        let summary = sched.run(tasks, 4).await;

        assert_eq!(summary.tasks_succeeded, 2);
        assert_eq!(summary.tasks_failed, 0);
        let lines = fx.ledger_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.ends_with("| 0.00 MB | Streaming")));
        assert!(fx.error_lines().is_empty());
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let fx = Fixture::new();
        let transport = Arc::new(MockTransport::new(
            TransportKind::Multipart,
            &[("bad.txt", Behavior::Fail), ("boom.txt", Behavior::Panic)],
        ));
        let sched = fx.scheduler(TransportSet::new().with(transport), Arc::new(NoopReporter));

        let tasks = vec![
            fx.task(1, "ok1.txt", TransportKind::Multipart),
            fx.task(2, "bad.txt", TransportKind::Multipart),
            fx.task(3, "boom.txt", TransportKind::Multipart),
            fx.task(4, "ok2.txt", TransportKind::Multipart),
        ];
        let (summary, outcomes) = sched.run_with_outcomes(tasks, 2).await;

        assert_eq!(summary.tasks_succeeded, 2);
        assert_eq!(summary.tasks_failed, 2);
        assert_eq!(
            outcomes.iter().map(|o| o.task_id).collect::<Vec<_>>(),
            vec![TaskId(1), TaskId(2), TaskId(3), TaskId(4)]
        );
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[1].result, Err("HTTP 400: bad request".into()));
        assert!(outcomes[2].result.as_ref().unwrap_err().contains("task aborted"));

        assert_eq!(fx.ledger_lines().len(), 2);
        let errors = fx.error_lines();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|l| l.contains("bad.txt — HTTP 400: bad request")));
    }

    #[tokio::test]
    async fn missing_transport_fails_the_task() {
        let fx = Fixture::new();
        let sched = fx.scheduler(TransportSet::new(), Arc::new(NoopReporter));

        let (summary, outcomes) = sched
            .run_with_outcomes(vec![fx.task(1, "a.txt", TransportKind::Multipart)], 1)
            .await;

        assert_eq!(summary.tasks_failed, 1);
        assert_eq!(
            outcomes[0].result,
            Err("no transport configured for Multipart".into())
        );
        assert_eq!(fx.error_lines().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn active_tasks_never_exceed_limit() {
        let fx = Fixture::new();
        let names: Vec<String> = (0..20).map(|i| format!("f{i:02}.bin")).collect();
        let behaviors: Vec<(&str, Behavior)> = names
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let delay_ms = [0, 5, 50, 500][i % 4];
                (n.as_str(), Behavior::Succeed { delay_ms })
            })
            .collect();
        let transport = Arc::new(MockTransport::new(TransportKind::Streaming, &behaviors));
        let sched = fx.scheduler(
            TransportSet::new().with(transport.clone()),
            Arc::new(NoopReporter),
        );

        let tasks = names
            .iter()
            .enumerate()
            .map(|(i, n)| fx.task(i as u64, n, TransportKind::Streaming))
            .collect();
        let summary = sched.run(tasks, 3).await;

        assert_eq!(summary.tasks_succeeded, 20);
        assert!(transport.max_active.load(Ordering::SeqCst) <= 3);
        assert_eq!(transport.active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn admission_is_fifo_at_limit_one() {
        let fx = Fixture::new();
        let transport = Arc::new(MockTransport::new(
            TransportKind::Streaming,
            &[
                ("c.txt", Behavior::Succeed { delay_ms: 30 }),
                ("a.txt", Behavior::Succeed { delay_ms: 10 }),
                ("b.txt", Behavior::Succeed { delay_ms: 20 }),
            ],
        ));
        let sched = fx.scheduler(
            TransportSet::new().with(transport.clone()),
            Arc::new(NoopReporter),
        );

        let tasks = vec![
            fx.task(1, "c.txt", TransportKind::Streaming),
            fx.task(2, "a.txt", TransportKind::Streaming),
            fx.task(3, "b.txt", TransportKind::Streaming),
        ];
        sched.run(tasks, 1).await;

        assert_eq!(*transport.started.lock().unwrap(), vec!["c.txt", "a.txt", "b.txt"]);
        assert_eq!(transport.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_limit_is_clamped() {
        let fx = Fixture::new();
        let transport = Arc::new(MockTransport::new(TransportKind::Streaming, &[]));
        let sched = fx.scheduler(
            TransportSet::new().with(transport.clone()),
            Arc::new(NoopReporter),
        );

        let summary = sched
            .run(vec![fx.task(1, "a.txt", TransportKind::Streaming)], 0)
            .await;
        assert_eq!(summary.tasks_succeeded, 1);
        assert_eq!(transport.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ledger_is_durable_when_run_is_interrupted() {
        let fx = Fixture::new();
        let transport = Arc::new(MockTransport::new(
            TransportKind::Streaming,
            &[("d.txt", Behavior::Hang)],
        ));
        let sched = fx.scheduler(TransportSet::new().with(transport), Arc::new(NoopReporter));

        let tasks = vec![
            fx.task(1, "a.txt", TransportKind::Streaming),
            fx.task(2, "b.txt", TransportKind::Streaming),
            fx.task(3, "c.txt", TransportKind::Streaming),
            fx.task(4, "d.txt", TransportKind::Streaming),
            fx.task(5, "e.txt", TransportKind::Streaming),
        ];
        let interrupted =
            tokio::time::timeout(Duration::from_secs(60), sched.run(tasks, 1)).await;
        assert!(interrupted.is_err());

        let lines = fx.ledger_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("c.txt"));
    }

    #[tokio::test]
    async fn progress_is_reported_per_task() {
        let fx = Fixture::new();
        let reporter = Arc::new(RecordingReporter::default());
        let transport = Arc::new(MockTransport::new(
            TransportKind::Streaming,
            &[("bad.txt", Behavior::Fail)],
        ));
        let sched = fx.scheduler(TransportSet::new().with(transport), reporter.clone());

        sched
            .run(
                vec![
                    fx.task(1, "good.txt", TransportKind::Streaming),
                    fx.task(2, "bad.txt", TransportKind::Streaming),
                ],
                2,
            )
            .await;

        assert_eq!(reporter.names.lock().unwrap()[&TaskId(1)], "good.txt");
        assert_eq!(reporter.bytes.lock().unwrap().get(&TaskId(1)), Some(&100));
        assert_eq!(reporter.bytes.lock().unwrap().get(&TaskId(2)), None);

        let finished = reporter.finished.lock().unwrap();
        assert!(finished[&TaskId(1)]);
        assert!(!finished[&TaskId(2)]);
    }
}
