//! The three mirror page-structure generations as extraction strategies.
//!
//! Each strategy fetches the page its own way and pattern-matches the HTML
//! with regexes; none of this is backed by a schema on the mirror's side.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::download::{DownloadError, HttpClient, RetryPolicy, retrying};

use super::{Extraction, LinkExtractor, ResolveRequest, absolutize};

/// Literal phrase the form-POST page generation uses for unavailable articles.
const NOT_INCLUDED_PHRASE: &str = "Sorry, sci-hub has not included this article yet";

fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static ANCHOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<a\s[^>]*>"));
static HASH_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)href\s*=\s*["']#["']"#));
static ONCLICK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)onclick\s*=\s*"([^"]*)""#));
static SINGLE_QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"'([^']+)'"));
static ARTICLE_DIV_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)<div[^>]*id\s*=\s*["']article["'][^>]*>(.*)"#));
static IFRAME_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)<iframe[^>]*src\s*=\s*["']([^"']+)["']"#));
static EMBED_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)<embed[^>]*src\s*=\s*["']([^"']+)["']"#));
static LOCATION_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"location\.href\s*=\s*'([^']+)'"));

/// Canonical strategy for the most recent page generation:
/// a save button rendered as `<a href="#" onclick="location.href='...'">`.
#[derive(Debug, Default)]
pub struct AnchorOnclick;

impl AnchorOnclick {
    /// Pure extraction over already-fetched HTML.
    #[must_use]
    pub fn extract(html: &str) -> Extraction {
        for tag in ANCHOR_TAG_RE.find_iter(html) {
            let tag = tag.as_str();
            if !HASH_HREF_RE.is_match(tag) {
                continue;
            }
            let Some(onclick) = ONCLICK_RE
                .captures(tag)
                .and_then(|caps| caps.get(1).map(|m| m.as_str()))
            else {
                continue;
            };
            if let Some(quoted) = SINGLE_QUOTED_RE
                .captures(onclick)
                .and_then(|caps| caps.get(1).map(|m| m.as_str()))
            {
                let url = absolutize(&quoted.replace('\\', ""));
                return Extraction::Pdf(url);
            }
        }
        Extraction::NoMatch
    }
}

#[async_trait]
impl LinkExtractor for AnchorOnclick {
    fn name(&self) -> &'static str {
        "anchor-onclick"
    }

    async fn resolve(
        &self,
        client: &HttpClient,
        retry: &RetryPolicy,
        request: &ResolveRequest<'_>,
    ) -> Result<Extraction, DownloadError> {
        let html = retrying(retry, || client.get_page(request.article_url)).await?;
        Ok(Self::extract(&html))
    }
}

/// Strategy for the `<div id="article">` generation: the PDF lives in an
/// iframe (or embed) inside the article container.
#[derive(Debug, Default)]
pub struct ArticleFrame;

impl ArticleFrame {
    /// Pure extraction over already-fetched HTML.
    ///
    /// An absent article container is the mirror's "not available" signal
    /// for this generation; a container without any frame is unrecognized.
    #[must_use]
    pub fn extract(html: &str) -> Extraction {
        let Some(container) = ARTICLE_DIV_RE
            .captures(html)
            .and_then(|caps| caps.get(1).map(|m| m.as_str()))
        else {
            return Extraction::NotFound;
        };
        let src = IFRAME_SRC_RE
            .captures(container)
            .or_else(|| EMBED_SRC_RE.captures(container))
            .and_then(|caps| caps.get(1).map(|m| m.as_str()));
        match src {
            Some(src) => {
                let trimmed = src.split('#').next().unwrap_or(src);
                Extraction::Pdf(absolutize(trimmed))
            }
            None => Extraction::NoMatch,
        }
    }
}

#[async_trait]
impl LinkExtractor for ArticleFrame {
    fn name(&self) -> &'static str {
        "article-frame"
    }

    async fn resolve(
        &self,
        client: &HttpClient,
        retry: &RetryPolicy,
        request: &ResolveRequest<'_>,
    ) -> Result<Extraction, DownloadError> {
        let html = retrying(retry, || client.get_page(request.article_url)).await?;
        Ok(Self::extract(&html))
    }
}

/// Strategy for the oldest generation: POST the identifier as form field
/// `request` to the mirror root and read a `location.href` assignment out
/// of the response body.
#[derive(Debug, Default)]
pub struct EmbedForm;

impl EmbedForm {
    /// Pure extraction over the form-POST response body.
    #[must_use]
    pub fn extract(html: &str) -> Extraction {
        if html.contains(NOT_INCLUDED_PHRASE) {
            return Extraction::NotFound;
        }
        match LOCATION_HREF_RE
            .captures(html)
            .and_then(|caps| caps.get(1).map(|m| m.as_str()))
        {
            Some(url) => Extraction::Pdf(absolutize(&url.replace('\\', ""))),
            None => Extraction::NoMatch,
        }
    }
}

#[async_trait]
impl LinkExtractor for EmbedForm {
    fn name(&self) -> &'static str {
        "embed-form"
    }

    async fn resolve(
        &self,
        client: &HttpClient,
        retry: &RetryPolicy,
        request: &ResolveRequest<'_>,
    ) -> Result<Extraction, DownloadError> {
        let base = request.mirror_base.as_str();
        let form = [("request", request.identifier)];
        let body = retrying(retry, || client.post_form(base, &form)).await?;
        Ok(Self::extract(&body))
    }
}
