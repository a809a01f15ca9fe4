//! Link resolution: mirror article page to direct PDF URL.
//!
//! The mirror's page structure is an external, unversioned contract that can
//! break without notice; extraction is best-effort pattern matching against
//! third-party HTML, not a schema. Three page-structure generations are
//! supported as [`LinkExtractor`] strategies:
//!
//! - [`AnchorOnclick`] (canonical default) - `<a href="#" onclick="...">`
//! - [`ArticleFrame`] - `<div id="article">` containing an iframe/embed
//! - [`EmbedForm`] - POST-driven page with a `location.href` assignment
//!
//! [`MirrorResolver`] tries its configured strategies in order; the first
//! conclusive outcome (a PDF URL or a clean not-found signal) wins. When no
//! strategy recognizes the page at all, the failure is reported as
//! [`ResolveError::UnrecognizedPage`] so operators can spot mirror-format
//! drift, distinct from an ordinary not-found.

mod strategies;

use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::download::{DownloadError, HttpClient, RetryPolicy};
use crate::source::Identifier;

pub use strategies::{AnchorOnclick, ArticleFrame, EmbedForm};

/// Errors raised during link resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The page fetch failed after exhausting retries.
    #[error("failed to fetch mirror page for {identifier}: {source}")]
    Http {
        /// The identifier being resolved.
        identifier: String,
        /// The underlying HTTP error.
        #[source]
        source: DownloadError,
    },

    /// The page was fetched but no configured strategy recognized it.
    ///
    /// Usually means the mirror changed its page structure.
    #[error("unrecognized mirror page structure for {identifier}")]
    UnrecognizedPage {
        /// The identifier being resolved.
        identifier: String,
    },

    /// An article URL could not be built for the identifier.
    #[error("cannot build article URL for {identifier}")]
    InvalidIdentifier {
        /// The offending identifier.
        identifier: String,
    },
}

/// Result of one strategy's attempt against a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Direct PDF URL found.
    Pdf(String),
    /// The mirror affirmatively signalled the article is not available.
    NotFound,
    /// This strategy does not recognize the page structure.
    NoMatch,
}

/// Conclusive outcome of resolving one identifier against the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Direct PDF URL ready for download.
    Pdf(String),
    /// The article is not available on the mirror.
    NotFound,
}

/// Inputs one strategy needs to fetch and inspect the mirror page.
#[derive(Debug)]
pub struct ResolveRequest<'a> {
    /// Fully built article page URL (mirror base joined with identifier,
    /// or an arXiv abstract URL).
    pub article_url: &'a str,
    /// The raw identifier, needed by form-POST strategies.
    pub identifier: &'a str,
    /// The mirror base URL.
    pub mirror_base: &'a Url,
}

/// A page-link extraction strategy for one mirror page generation.
///
/// Strategies perform their own fetch (GET page or POST form, per protocol)
/// and return [`Extraction::NoMatch`] when the page shape is not theirs, so
/// the resolver can fall through to the next strategy.
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    /// Strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Fetches the page and attempts extraction.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the fetch itself fails after retries.
    async fn resolve(
        &self,
        client: &HttpClient,
        retry: &RetryPolicy,
        request: &ResolveRequest<'_>,
    ) -> Result<Extraction, DownloadError>;
}

/// Mirror protocol selection for the whole run.
///
/// The selected protocol's strategy is tried first; the remaining
/// strategies serve as fallbacks only when the page structure is not
/// recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorProtocol {
    /// `<a href="#" onclick="...">` pages (most recent generation).
    #[default]
    Anchor,
    /// `<div id="article">` iframe/embed pages.
    Frame,
    /// Form-POST pages with a `location.href` assignment.
    Embed,
}

impl MirrorProtocol {
    /// Ordered strategy chain: the selected protocol first, the remaining
    /// generations as structure-drift fallbacks.
    #[must_use]
    pub fn strategy_chain(self) -> Vec<Box<dyn LinkExtractor>> {
        let mut chain: Vec<Box<dyn LinkExtractor>> = Vec::with_capacity(3);
        match self {
            Self::Anchor => {
                chain.push(Box::new(AnchorOnclick));
                chain.push(Box::new(ArticleFrame));
                chain.push(Box::new(EmbedForm));
            }
            Self::Frame => {
                chain.push(Box::new(ArticleFrame));
                chain.push(Box::new(AnchorOnclick));
                chain.push(Box::new(EmbedForm));
            }
            Self::Embed => {
                chain.push(Box::new(EmbedForm));
                chain.push(Box::new(AnchorOnclick));
                chain.push(Box::new(ArticleFrame));
            }
        }
        chain
    }
}

impl FromStr for MirrorProtocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "anchor" => Ok(Self::Anchor),
            "frame" => Ok(Self::Frame),
            "embed" => Ok(Self::Embed),
            other => Err(format!(
                "unknown protocol `{other}` (expected anchor, frame, or embed)"
            )),
        }
    }
}

/// Resolves identifiers to direct PDF URLs against one mirror.
pub struct MirrorResolver {
    base: Url,
    strategies: Vec<Box<dyn LinkExtractor>>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for MirrorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorResolver")
            .field("base", &self.base.as_str())
            .field("strategies", &self.strategies.len())
            .finish_non_exhaustive()
    }
}

impl MirrorResolver {
    /// Creates a resolver for `base` using the protocol's strategy chain.
    #[must_use]
    pub fn new(base: Url, protocol: MirrorProtocol, retry: RetryPolicy) -> Self {
        Self {
            base,
            strategies: protocol.strategy_chain(),
            retry,
        }
    }

    /// Creates a resolver with an explicit strategy chain.
    #[must_use]
    pub fn with_strategies(
        base: Url,
        strategies: Vec<Box<dyn LinkExtractor>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            base,
            strategies,
            retry,
        }
    }

    /// The mirror base URL.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Builds the article page URL for `identifier`.
    ///
    /// DOIs and other path-like identifiers are joined onto the mirror base;
    /// full URLs replace it outright (standard URL-join semantics); arXiv
    /// tags point at the arXiv abstract page instead of the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidIdentifier`] when the join fails.
    pub fn article_url(&self, identifier: &Identifier) -> Result<String, ResolveError> {
        if let Some(arxiv_id) = identifier.arxiv_id() {
            return Ok(format!("https://arxiv.org/abs/{arxiv_id}"));
        }
        self.base
            .join(identifier.as_str())
            .map(|url| url.to_string())
            .map_err(|_| ResolveError::InvalidIdentifier {
                identifier: identifier.to_string(),
            })
    }

    /// Resolves one article page to a PDF URL or a clean not-found.
    ///
    /// Strategies run in configured order; `NoMatch` falls through to the
    /// next strategy, anything conclusive returns immediately.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Http`] when a fetch exhausts retries;
    /// [`ResolveError::UnrecognizedPage`] when every strategy reports
    /// `NoMatch`.
    #[instrument(skip(self, client), fields(identifier = request.identifier))]
    pub async fn resolve_link(
        &self,
        client: &HttpClient,
        request: &ResolveRequest<'_>,
    ) -> Result<LinkOutcome, ResolveError> {
        for strategy in &self.strategies {
            let extraction = strategy
                .resolve(client, &self.retry, request)
                .await
                .map_err(|source| ResolveError::Http {
                    identifier: request.identifier.to_string(),
                    source,
                })?;
            match extraction {
                Extraction::Pdf(url) => {
                    debug!(strategy = strategy.name(), pdf_url = %url, "PDF link extracted");
                    return Ok(LinkOutcome::Pdf(url));
                }
                Extraction::NotFound => {
                    debug!(strategy = strategy.name(), "mirror reports article not available");
                    return Ok(LinkOutcome::NotFound);
                }
                Extraction::NoMatch => {
                    debug!(strategy = strategy.name(), "page structure not recognized, trying next");
                }
            }
        }
        Err(ResolveError::UnrecognizedPage {
            identifier: request.identifier.to_string(),
        })
    }
}

/// Normalizes a protocol-relative (`//host/...`) URL to https.
pub(crate) fn absolutize(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}
