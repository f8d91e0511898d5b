use std::collections::HashSet;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use folderpush_transfer::{FileRecord, TransportKind, bytes_to_mb};
use tracing::debug;

use crate::LEDGER_DELIMITER;
use crate::error::LedgerError;

/// One completed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub path: String,
    pub size_mb: f64,
    pub backend_label: String,
}

impl LedgerEntry {
    pub fn new(path: impl Into<String>, size_mb: f64, backend_label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size_mb,
            backend_label: backend_label.into(),
        }
    }

    /// Builds the entry for a file uploaded through `backend`.
    pub fn for_upload(file: &FileRecord, backend: TransportKind) -> Self {
        Self::new(file.ledger_key(), bytes_to_mb(file.size_bytes), backend.label())
    }

    /// Formats the entry as one ledger line, including the newline.
    pub fn to_line(&self) -> String {
        format!(
            "{} | {:.2} MB | {}\n",
            self.path, self.size_mb, self.backend_label
        )
    }
}

/// Extracts the path field of a ledger line.
///
/// Returns `None` for lines without a delimiter or with an empty path.
pub fn parse_ledger_path(line: &str) -> Option<&str> {
    let (path, _) = line.split_once(LEDGER_DELIMITER)?;
    let path = path.trim();
    if path.is_empty() { None } else { Some(path) }
}

/// Append-only record of completed uploads.
///
/// The set of known paths is loaded once by [`Ledger::load`] and is not
/// refreshed by [`Ledger::append`] or by other writers during the run.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    uploaded: HashSet<String>,
}

impl Ledger {
    /// Loads the ledger at `path`.
    ///
    /// A missing file yields an empty ledger. Malformed lines are skipped.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let mut uploaded = HashSet::new();

        let file = match std::fs::File::open(&path) {
            Ok(f) => Some(f),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(LedgerError::io(&path, e)),
        };

        if let Some(file) = file {
            let mut reader = BufReader::new(file);
            let mut buf = Vec::new();
            let mut line_no = 0usize;
            loop {
                buf.clear();
                let n = reader
                    .read_until(b'\n', &mut buf)
                    .map_err(|e| LedgerError::io(&path, e))?;
                if n == 0 {
                    break;
                }
                line_no += 1;

                let Ok(line) = std::str::from_utf8(&buf) else {
                    debug!(ledger = %path.display(), line = line_no, "skipping non-UTF-8 ledger line");
                    continue;
                };
                let line = line.trim_end_matches(['\n', '\r']);
                if line.trim().is_empty() {
                    continue;
                }
                match parse_ledger_path(line) {
                    Some(p) => {
                        uploaded.insert(p.to_string());
                    }
                    None => debug!(
                        ledger = %path.display(),
                        line = line_no,
                        "skipping malformed ledger line"
                    ),
                }
            }
        }

        debug!(ledger = %path.display(), entries = uploaded.len(), "ledger loaded");
        Ok(Self { path, uploaded })
    }

    /// Returns `true` if `path` appeared anywhere in the ledger at load time.
    pub fn contains(&self, path: &str) -> bool {
        self.uploaded.contains(path)
    }

    /// Appends one entry. Opens, writes a single line and closes the file.
    pub fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        append_line(&self.path, &entry.to_line())
    }

    /// Number of distinct paths known at load time.
    pub fn len(&self) -> usize {
        self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Appends `line` to `path` with a single write call.
pub(crate) fn append_line(path: &Path, line: &str) -> Result<(), LedgerError> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LedgerError::io(path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| LedgerError::io(path, e))
}
