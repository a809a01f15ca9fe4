//! Journal-mode command handler: ISSN plus year range.

use std::path::Path;

use anyhow::Result;
use tracing::error;

use crate::executor::{Batch, DownloadExecutor, DownloadTask};
use crate::metadata::{CrossrefClient, JournalWorks};
use crate::resolver::MirrorResolver;
use crate::source::JournalQuery;

use super::{RunOptions, prepare, year_batch_dir};

/// Downloads every article of one journal across an inclusive year range.
///
/// Crossref is paginated once for the whole range; each year then runs as
/// its own batch with its own directory and missing log. A year with no
/// metadata prints a notice and produces no directory.
pub async fn run_issn_command(
    options: &RunOptions,
    issn: &str,
    year_from: u16,
    year_to: Option<u16>,
) -> Result<()> {
    let query = JournalQuery::new(issn, year_from, year_to.unwrap_or(year_from))?;
    let context = prepare(options)?;

    let crossref = CrossrefClient::new(context.client.clone(), context.retry.clone());
    let works = crossref.journal_works(&query).await?;

    let executor =
        DownloadExecutor::new(context.client.clone(), context.retry.clone(), options.show_progress);
    download_year_batches(&executor, &context.resolver, &works, &query, &context.dir).await;

    Ok(())
}

/// Runs one batch per year of the query, in order.
///
/// A batch-fatal failure in one year (unwritable directory or missing log)
/// is reported and the remaining years still run; only per-run usage errors
/// abort the whole command, upstream of this loop.
pub async fn download_year_batches(
    executor: &DownloadExecutor,
    resolver: &MirrorResolver,
    works: &JournalWorks,
    query: &JournalQuery,
    dir: &Path,
) {
    let title = works.container_title.as_deref().unwrap_or(&query.issn);

    for year in query.years() {
        let records = works.for_year(year);
        if records.is_empty() {
            println!("{title}: no article in year {year}");
            continue;
        }
        println!("{title}: {} articles in year {year}", records.len());

        let tasks: Vec<DownloadTask> = records
            .iter()
            .filter_map(|record| DownloadTask::from_work(record, &query.issn, year))
            .collect();
        let batch = Batch {
            label: format!("{}_{year}", query.issn),
            dir: year_batch_dir(dir, &query.issn, year),
            tasks,
        };
        match executor.run_batch(resolver, &batch).await {
            Ok(report) => println!("{}", report.summary()),
            Err(err) => {
                error!(batch = %batch.label, %err, "batch aborted");
                eprintln!("{title}: year {year} failed: {err}");
            }
        }
    }
}
