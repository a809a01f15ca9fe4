//! Identifier-mode command handler: literal identifiers and list files.

use anyhow::Result;

use crate::executor::{Batch, DownloadExecutor, DownloadTask};
use crate::source::expand_identifiers;

use super::{RunOptions, prepare};

/// Downloads a list of identifiers as one batch into the output directory.
///
/// Tokens ending in `.txt`/`.bib` expand to the identifiers they contain;
/// everything else is taken literally. The whole list shares one
/// `missing.log` in the output directory.
pub async fn run_doi_command(options: &RunOptions, tokens: &[String]) -> Result<()> {
    let identifiers = expand_identifiers(tokens)?;
    let context = prepare(options)?;

    if identifiers.is_empty() {
        println!("no identifiers to download");
        return Ok(());
    }
    println!("{} identifiers to download", identifiers.len());

    let tasks: Vec<DownloadTask> = identifiers
        .into_iter()
        .map(DownloadTask::from_identifier)
        .collect();
    let batch = Batch {
        label: "paper list".to_string(),
        dir: context.dir.clone(),
        tasks,
    };

    let executor =
        DownloadExecutor::new(context.client.clone(), context.retry.clone(), options.show_progress);
    let report = executor.run_batch(&context.resolver, &batch).await?;
    println!("{}", report.summary());

    Ok(())
}
