//! Batch download execution.
//!
//! [`DownloadExecutor::run_batch`] drives one batch strictly sequentially:
//! resolve the mirror link, stream the PDF to disk, record failures in the
//! batch's `missing.log`, and move on. One article's failure never aborts
//! the batch; only the inability to prepare the batch directory or write
//! the missing log is batch-fatal.

mod missing_log;
mod task;

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::download::{HttpClient, RetryPolicy, retrying};
use crate::resolver::{LinkOutcome, MirrorResolver, ResolveError, ResolveRequest};

pub use missing_log::{MISSING_LOG_NAME, MissingKind, MissingLog};
pub use task::DownloadTask;

/// Batch-fatal executor failures.
///
/// Per-article failures are not errors at this level; they land in the
/// missing log and the batch continues.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The batch directory or missing log could not be prepared or written.
    #[error("batch file-system failure at {path}: {source}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// One batch of download work sharing an output directory and missing log.
#[derive(Debug)]
pub struct Batch {
    /// Human-readable batch label for logs (`0002-9602_2021`, `doi list`).
    pub label: String,
    /// Output directory; created if absent.
    pub dir: PathBuf,
    /// Tasks in source order.
    pub tasks: Vec<DownloadTask>,
}

/// Outcome of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Number of tasks in the batch.
    pub total: usize,
    /// Files present after the run (freshly downloaded or already on disk).
    pub downloaded: usize,
    /// Lines written to the missing log.
    pub missing: u64,
    /// Path of the batch's missing log.
    pub log_path: PathBuf,
}

impl BatchReport {
    /// One-line per-batch summary for the console.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}/{} downloaded; missing log: {}",
            self.downloaded,
            self.total,
            self.log_path.display()
        )
    }
}

/// Sequential batch runner.
pub struct DownloadExecutor {
    client: HttpClient,
    retry: RetryPolicy,
    show_progress: bool,
}

impl DownloadExecutor {
    /// Creates an executor over the shared HTTP client.
    #[must_use]
    pub fn new(client: HttpClient, retry: RetryPolicy, show_progress: bool) -> Self {
        Self {
            client,
            retry,
            show_progress,
        }
    }

    /// Runs every task in the batch, strictly one at a time.
    ///
    /// Already-present files are skipped without any network activity, so
    /// re-running a batch only fetches what is still missing. Each failed
    /// article is recorded in the batch's `missing.log` and the run
    /// continues with the next task.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Io`] when the batch directory cannot be
    /// created or the missing log cannot be written.
    #[instrument(skip(self, resolver, batch), fields(batch = %batch.label, tasks = batch.tasks.len()))]
    pub async fn run_batch(
        &self,
        resolver: &MirrorResolver,
        batch: &Batch,
    ) -> Result<BatchReport, ExecutorError> {
        tokio::fs::create_dir_all(&batch.dir)
            .await
            .map_err(|source| ExecutorError::Io {
                path: batch.dir.clone(),
                source,
            })?;
        let mut log = MissingLog::create(&batch.dir).await?;
        let progress = self.progress_bar(batch.tasks.len() as u64);

        let mut downloaded = 0usize;
        for task in &batch.tasks {
            progress.set_message(task.identifier.as_str().to_string());
            if self.run_task(resolver, &batch.dir, task, &mut log).await? {
                downloaded += 1;
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        let report = BatchReport {
            total: batch.tasks.len(),
            downloaded,
            missing: log.entries(),
            log_path: log.path().to_path_buf(),
        };
        info!(
            batch = %batch.label,
            downloaded = report.downloaded,
            missing = report.missing,
            "batch finished"
        );
        Ok(report)
    }

    /// Runs one task; returns whether the file is present afterwards.
    async fn run_task(
        &self,
        resolver: &MirrorResolver,
        dir: &Path,
        task: &DownloadTask,
        log: &mut MissingLog,
    ) -> Result<bool, ExecutorError> {
        let dest = dir.join(&task.file_name);
        if dest.exists() {
            debug!(file = %dest.display(), "already downloaded, skipping");
            return Ok(true);
        }

        let article_url = match resolver.article_url(&task.identifier) {
            Ok(url) => url,
            Err(error) => {
                debug!(%error, "cannot build article URL");
                log.record(MissingKind::Error, &task.warning).await?;
                return Ok(false);
            }
        };
        let request = ResolveRequest {
            article_url: &article_url,
            identifier: task.identifier.as_str(),
            mirror_base: resolver.base(),
        };

        let pdf_url = match resolver.resolve_link(&self.client, &request).await {
            Ok(LinkOutcome::Pdf(url)) => url,
            Ok(LinkOutcome::NotFound) => {
                log.record(MissingKind::NotFound, &task.warning).await?;
                return Ok(false);
            }
            Err(ResolveError::UnrecognizedPage { .. }) => {
                log.record(MissingKind::UnexpectedPage, &task.warning).await?;
                return Ok(false);
            }
            Err(error) => {
                debug!(%error, "link resolution failed");
                log.record(MissingKind::Error, &task.warning).await?;
                return Ok(false);
            }
        };

        match retrying(&self.retry, || self.client.download_to_file(&pdf_url, &dest)).await {
            Ok(bytes) => {
                debug!(file = %dest.display(), bytes, "downloaded");
                Ok(true)
            }
            Err(error) => {
                debug!(%error, "download failed");
                log.record(MissingKind::Error, &task.warning).await?;
                Ok(false)
            }
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar
    }
}
