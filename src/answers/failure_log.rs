//! Append-only log of answers the extractor could not read.
//!
//! Each entry is written for a human to inspect later:
//! ```text
//! ============================================================
//! mode = single
//! ------------------------------------------------------------
//! prompt
//! {prompt}
//! ------------------------------------------------------------
//! text
//! {raw model text}
//! ------------------------------------------------------------
//! Expect
//!
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::AnswerMode;
use crate::config::ExperimentPaths;

const DIVIDER_WIDTH: usize = 60;

/// Serializes appends from threads of this process; `O_APPEND` covers other processes.
static APPEND_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `errors.txt` at the root of a survey project.
    pub fn for_experiment(paths: &ExperimentPaths) -> Self {
        Self::new(paths.errors_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Never fails the caller; I/O errors are logged.
    pub fn record(&self, mode: AnswerMode, prompt: &str, text: &str) {
        let entry = format_entry(mode, prompt, text);
        match self.append(&entry) {
            Ok(()) => tracing::debug!(
                path = %self.path.display(),
                mode = %mode,
                "Failure log: entry appended"
            ),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failure log: failed to append entry"
            ),
        }
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        // A poisoned lock only means another writer panicked mid-append.
        let _guard = APPEND_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        file.flush()
    }
}

/// Render one complete entry.
pub fn format_entry(mode: AnswerMode, prompt: &str, text: &str) -> String {
    let heavy = "=".repeat(DIVIDER_WIDTH);
    let light = "-".repeat(DIVIDER_WIDTH);
    format!(
        "{heavy}\nmode = {mode}\n{light}\nprompt\n{prompt}\n{light}\ntext\n{text}\n{light}\nExpect\n\n"
    )
}
