//! Terminal progress bars, one per active upload.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use folderpush_transfer::{FileRecord, ProgressReporter, TaskId};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing_subscriber::fmt::MakeWriter;

const BAR_TEMPLATE: &str =
    "{msg:30!} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";

/// Renders a bar per task inside one [`MultiProgress`].
///
/// Bars are keyed by [`TaskId`], so concurrent tasks never share a counter.
/// A bar disappears once its task finishes; failures stay visible.
pub struct TerminalReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<TaskId, ProgressBar>>,
    style: ProgressStyle,
}

impl TerminalReporter {
    /// Draws into `multi`, which should be the one behind [`LogWriter`].
    pub fn new(multi: MultiProgress) -> Self {
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        Self {
            multi,
            bars: Mutex::new(HashMap::new()),
            style,
        }
    }

    fn bar(&self, id: TaskId) -> Option<ProgressBar> {
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }
}

/// Log sink that clears the bars while a line is written to stderr.
#[derive(Clone)]
pub struct LogWriter {
    multi: MultiProgress,
}

impl LogWriter {
    pub fn new(multi: MultiProgress) -> Self {
        Self { multi }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().lock().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl ProgressReporter for TerminalReporter {
    fn task_started(&self, id: TaskId, file: &FileRecord) {
        let bar = self.multi.add(ProgressBar::new(file.size_bytes));
        bar.set_style(self.style.clone());
        bar.set_message(file.file_name());
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, bar);
    }

    fn on_bytes(&self, id: TaskId, delta: u64) {
        if let Some(bar) = self.bar(id) {
            bar.inc(delta);
        }
    }

    fn task_finished(&self, id: TaskId, success: bool) {
        let bar = self
            .bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(bar) = bar {
            if success {
                bar.finish_and_clear();
                self.multi.remove(&bar);
            } else {
                bar.abandon_with_message(format!("{} (failed)", bar.message()));
            }
        }
    }
}
