// src/progress.rs
use std::path::Path;

/// Progress reporting for the long-running operations (pipeline run, batch reports).
/// Binaries implement this to surface status; library code only calls it.
pub trait Progress {
    /// Called at the start with the total number of items (if known).
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One logical unit completed (a stage, an archive, a report).
    fn item_done(&mut self, _path: &Path) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Prints to stderr, keeping stdout for the final tally.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn item_done(&mut self, path: &Path) {
        self.done += 1;
        if self.total > 0 {
            eprintln!("[{}/{}] {}", self.done, self.total, path.display());
        } else {
            eprintln!("{}", path.display());
        }
    }
}
