//! Per-batch missing log.
//!
//! Every batch writes a `missing.log` in its output directory recording each
//! article that could not be downloaded, one line per failure. The file is
//! truncated at batch start, so after a run it reflects exactly that run: an
//! empty log means a fully successful batch. Lines are flushed as they are
//! written so an interrupted run still shows what failed before the cut.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::ExecutorError;

/// File name of the per-batch log.
pub const MISSING_LOG_NAME: &str = "missing.log";

/// Failure categories recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKind {
    /// The mirror affirmatively reported the article unavailable.
    NotFound,
    /// No extraction strategy recognized the mirror page.
    UnexpectedPage,
    /// Network or file-system failure after exhausting retries.
    Error,
}

impl MissingKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::UnexpectedPage => "UNEXPECTED_PAGE",
            Self::Error => "ERROR",
        }
    }
}

/// Append-only writer for one batch's `missing.log`.
#[derive(Debug)]
pub struct MissingLog {
    path: PathBuf,
    file: File,
    entries: u64,
}

impl MissingLog {
    /// Creates (truncating) `missing.log` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Io`] when the file cannot be created.
    pub async fn create(dir: &Path) -> Result<Self, ExecutorError> {
        let path = dir.join(MISSING_LOG_NAME);
        let file = File::create(&path)
            .await
            .map_err(|source| ExecutorError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file,
            entries: 0,
        })
    }

    /// Records one failed article under the given category.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Io`] when the line cannot be written; losing
    /// the failure record is batch-fatal, unlike the failure it records.
    pub async fn record(&mut self, kind: MissingKind, warning: &str) -> Result<(), ExecutorError> {
        warn!(kind = kind.prefix(), warning, "article not downloaded");
        let line = format!("{}:{}\n", kind.prefix(), warning);
        self.file
            .write_all(line.as_bytes())
            .await
            .map_err(|source| ExecutorError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.file
            .flush()
            .await
            .map_err(|source| ExecutorError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.entries += 1;
        Ok(())
    }

    /// Number of lines written so far.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
