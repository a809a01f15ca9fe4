//! CLI command handlers.

mod doi;
mod issn;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use url::Url;

use crate::download::{HttpClient, RetryPolicy};
use crate::resolver::{MirrorProtocol, MirrorResolver};

pub use doi::run_doi_command;
pub use issn::{download_year_batches, run_issn_command};

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Output directory; must already exist.
    pub dir: PathBuf,
    /// Mirror host name, without scheme.
    pub mirror_host: String,
    /// Mirror page protocol.
    pub protocol: MirrorProtocol,
    /// Maximum attempts per request.
    pub max_retries: u32,
    /// Render a progress bar during batches.
    pub show_progress: bool,
}

/// Validated shared state handed to the subcommand bodies.
pub(crate) struct RunContext {
    pub client: HttpClient,
    pub retry: RetryPolicy,
    pub resolver: MirrorResolver,
    pub dir: PathBuf,
}

/// Validates the shared options and builds the HTTP client and resolver.
///
/// Usage errors (missing directory, malformed mirror host) are reported
/// before any network activity.
pub(crate) fn prepare(options: &RunOptions) -> Result<RunContext> {
    if !options.dir.is_dir() {
        bail!(
            "output directory {} does not exist (create it first)",
            options.dir.display()
        );
    }
    let base = mirror_base_url(&options.mirror_host)?;

    let client = HttpClient::new().context("failed to build HTTP client")?;
    let retry = RetryPolicy::with_max_attempts(options.max_retries);
    let resolver = MirrorResolver::new(base, options.protocol, retry.clone());
    Ok(RunContext {
        client,
        retry,
        resolver,
        dir: options.dir.clone(),
    })
}

/// Builds the mirror base URL from a bare host name.
///
/// The scheme is fixed to https; a scheme-prefixed value is rejected rather
/// than silently rewritten.
pub(crate) fn mirror_base_url(host: &str) -> Result<Url> {
    if host.starts_with("http://") || host.starts_with("https://") {
        bail!("mirror host must be a bare host name, without scheme: got `{host}`");
    }
    if host.is_empty() || host.contains('/') {
        bail!("invalid mirror host `{host}`");
    }
    Url::parse(&format!("https://{host}/"))
        .with_context(|| format!("invalid mirror host `{host}`"))
}

/// Batch directory for one journal year: `<dir>/<ISSN>_<year>/`.
pub(crate) fn year_batch_dir(dir: &Path, issn: &str, year: u16) -> PathBuf {
    dir.join(format!("{issn}_{year}"))
}
