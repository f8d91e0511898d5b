//! Durable record of completed uploads.
//!
//! Two flat, line-delimited, append-only text files:
//!
//! - `upload.log`: `<path> | <sizeMB:.2f> MB | <Backend>`
//! - `error.log`: `<path> — <message>`
//!
//! Each append opens the file, writes one line and closes it again, so a
//! crash between tasks never loses an earlier completion.

mod error;
mod error_log;
mod ledger;

pub use error::LedgerError;
pub use error_log::{ErrorLog, ErrorRecord};
pub use ledger::{Ledger, LedgerEntry, parse_ledger_path};

/// Default ledger file name.
pub const DEFAULT_LEDGER_FILE: &str = "upload.log";

/// Default error log file name.
pub const DEFAULT_ERROR_LOG_FILE: &str = "error.log";

/// Field separator in ledger lines.
pub const LEDGER_DELIMITER: char = '|';
