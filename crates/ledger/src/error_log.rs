use std::path::{Path, PathBuf};

use crate::error::LedgerError;
use crate::ledger::append_line;

/// One failed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub path: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Formats the record as one log line.
    ///
    /// Newlines inside the message are flattened so one failure stays one line.
    pub fn to_line(&self) -> String {
        let message = self.message.replace(['\r', '\n'], " ");
        format!("{} — {}\n", self.path, message)
    }
}

/// Append-only diagnostic log of failed uploads. Never read back.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, record: &ErrorRecord) -> Result<(), LedgerError> {
        append_line(&self.path, &record.to_line())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_line_format() {
        let rec = ErrorRecord::new("/m/a.txt", "HTTP 413: too large");
        assert_eq!(rec.to_line(), "/m/a.txt — HTTP 413: too large\n");
    }

    #[test]
    fn multiline_message_is_flattened() {
        let rec = ErrorRecord::new("/m/a.txt", "first\nsecond");
        assert_eq!(rec.to_line(), "/m/a.txt — first second\n");
    }

    #[test]
    fn append_creates_and_extends() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(dir.path().join("error.log"));

        log.append(&ErrorRecord::new("/m/a", "boom")).unwrap();
        log.append(&ErrorRecord::new("/m/b", "bang")).unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "/m/a — boom\n/m/b — bang\n");
    }
}
