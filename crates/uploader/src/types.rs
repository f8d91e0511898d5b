//! Value types of a run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use folderpush_transfer::{FileRecord, TaskId, TransportKind};

/// How files are assigned to backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// Every file goes over the streaming session.
    #[default]
    StreamingOnly,
    /// Every file goes through the HTTP document API.
    MultipartOnly,
    /// Small files over HTTP, large files streamed.
    Hybrid,
}

/// Unrecognized `UPLOAD_MODE` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown upload mode {0:?} (expected telethon, bot or hybrid)")]
pub struct ParseModeError(pub String);

impl FromStr for UploadMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telethon" | "streaming" | "streaming-only" => Ok(UploadMode::StreamingOnly),
            "bot" | "multipart" | "multipart-only" => Ok(UploadMode::MultipartOnly),
            "hybrid" => Ok(UploadMode::Hybrid),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadMode::StreamingOnly => "streaming-only",
            UploadMode::MultipartOnly => "multipart-only",
            UploadMode::Hybrid => "hybrid",
        })
    }
}

/// Credentials presented to the streaming service at connect time.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_id: i64,
    pub api_hash: String,
    pub bot_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

/// One file bound to the backend that will move it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub id: TaskId,
    pub file: FileRecord,
    pub backend: TransportKind,
}

/// Terminal state of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub path: PathBuf,
    pub backend: TransportKind,
    /// Bytes delivered, or the recorded error message.
    pub result: Result<u64, String>,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tasks_considered: usize,
    pub tasks_skipped: usize,
    pub tasks_succeeded: usize,
    pub tasks_failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Upload finished: considered={} skipped={} succeeded={} failed={}",
            self.tasks_considered, self.tasks_skipped, self.tasks_succeeded, self.tasks_failed
        )
    }
}
