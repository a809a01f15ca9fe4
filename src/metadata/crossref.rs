//! Crossref works pagination for journal-mode queries.
//!
//! [`CrossrefClient`] walks `GET /journals/{issn}/works` with cursor-based
//! continuation (`cursor=*` to start, `next-cursor` from each response)
//! until every page of the filtered result set has been consumed, then
//! groups the accumulated works by publication year.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::download::{DownloadError, HttpClient, RetryPolicy, retrying};
use crate::source::JournalQuery;

/// Default Crossref API base URL.
const DEFAULT_BASE_URL: &str = "https://api.crossref.org";

/// Page size for works requests; the API maximum.
const ROWS_PER_PAGE: u32 = 1000;

/// Errors raised during metadata pagination.
///
/// Pagination failures are fatal for the whole journal query: a partial
/// result set is never returned.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The works request failed after exhausting retries.
    #[error("Crossref works request for ISSN {issn} failed: {source}")]
    Api {
        /// The ISSN being queried.
        issn: String,
        /// The underlying HTTP error.
        #[source]
        source: DownloadError,
    },
}

// ==================== Crossref API Response Types ====================

/// Top-level works response.
#[derive(Debug, Deserialize)]
pub(crate) struct WorksResponse {
    pub message: WorksMessage,
}

/// The `message` field of a works response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct WorksMessage {
    #[serde(default)]
    pub total_results: u64,
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub items: Vec<WorkRecord>,
}

/// One bibliographic work item from the Crossref response.
///
/// Produced only by the paginator; read-only downstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkRecord {
    /// The work's DOI, when registered.
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
    /// The work's landing URL, when present.
    #[serde(rename = "URL")]
    pub url: Option<String>,
    /// Journal volume.
    #[serde(default)]
    pub volume: Option<String>,
    /// Journal issue.
    #[serde(default)]
    pub issue: Option<String>,
    /// Container (journal) title list; the first entry is the display name.
    #[serde(default)]
    pub container_title: Vec<String>,
    /// Publication date as nested date-parts.
    pub published: Option<PublishedDate>,
}

/// A date entry in Crossref's nested date-parts form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PublishedDate {
    /// `[[year, month, day]]`, with trailing parts optional.
    pub date_parts: Option<Vec<Vec<Option<i32>>>>,
}

impl WorkRecord {
    /// Publication year: the first element of the first date-parts entry.
    #[must_use]
    pub fn year(&self) -> Option<u16> {
        self.published
            .as_ref()
            .and_then(|date| date.date_parts.as_ref())
            .and_then(|parts| parts.first())
            .and_then(|inner| inner.first())
            .copied()
            .flatten()
            .and_then(|year| u16::try_from(year).ok())
    }

    /// The identifier used for download: DOI preferred, URL as fallback.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.doi
            .as_deref()
            .or(self.url.as_deref())
            .filter(|value| !value.is_empty())
    }
}

/// Accumulated works for one journal query, grouped by publication year.
#[derive(Debug, Default)]
pub struct JournalWorks {
    /// Container title from the first accumulated item, when any.
    pub container_title: Option<String>,
    /// Works grouped by publication year; deterministic ascending order.
    pub by_year: BTreeMap<u16, Vec<WorkRecord>>,
}

impl JournalWorks {
    /// Works for `year`, empty when the year produced no results.
    #[must_use]
    pub fn for_year(&self, year: u16) -> &[WorkRecord] {
        self.by_year.get(&year).map_or(&[], Vec::as_slice)
    }
}

// ==================== CrossrefClient ====================

/// Paginating client for the Crossref journals/works endpoint.
#[derive(Debug)]
pub struct CrossrefClient {
    http: HttpClient,
    retry: RetryPolicy,
    base_url: String,
}

impl CrossrefClient {
    /// Creates a client against the public Crossref API.
    #[must_use]
    pub fn new(http: HttpClient, retry: RetryPolicy) -> Self {
        Self {
            http,
            retry,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(http: HttpClient, retry: RetryPolicy, base_url: impl Into<String>) -> Self {
        Self {
            http,
            retry,
            base_url: base_url.into(),
        }
    }

    /// Fetches every work for the query's ISSN and year range, grouped by year.
    ///
    /// The cursor starts at `*`; each page's `next-cursor` feeds the next
    /// request. The loop terminates once the accumulated count reaches the
    /// reported `total-results`, or when a page comes back empty.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Api`] when a page request exhausts retries;
    /// no partial result set is returned.
    #[instrument(skip(self), fields(issn = %query.issn))]
    pub async fn journal_works(&self, query: &JournalQuery) -> Result<JournalWorks, MetadataError> {
        let filter = format!(
            "from-pub-date:{}-01,until-pub-date:{}-12",
            query.year_start, query.year_end
        );
        let mut cursor = "*".to_string();
        let mut accumulated: Vec<WorkRecord> = Vec::new();

        loop {
            let url = format!(
                "{}/journals/{}/works?rows={}&cursor={}&filter={}",
                self.base_url,
                urlencoding::encode(&query.issn),
                ROWS_PER_PAGE,
                urlencoding::encode(&cursor),
                urlencoding::encode(&filter),
            );

            let response: WorksResponse = retrying(&self.retry, || self.http.get_json(&url))
                .await
                .map_err(|source| MetadataError::Api {
                    issn: query.issn.clone(),
                    source,
                })?;

            let message = response.message;
            let page_len = message.items.len();
            accumulated.extend(message.items);
            debug!(
                page_len,
                accumulated = accumulated.len(),
                total_results = message.total_results,
                "works page consumed"
            );

            if page_len == 0 || accumulated.len() as u64 >= message.total_results {
                break;
            }
            match message.next_cursor {
                Some(next) => cursor = next,
                None => break,
            }
        }

        Ok(group_by_year(accumulated))
    }
}

/// Groups works by publication year, dropping items with no usable
/// identifier or no parseable year.
fn group_by_year(works: Vec<WorkRecord>) -> JournalWorks {
    let container_title = works
        .first()
        .and_then(|record| record.container_title.first())
        .cloned();

    let mut by_year: BTreeMap<u16, Vec<WorkRecord>> = BTreeMap::new();
    for record in works {
        if record.identifier().is_none() {
            debug!("dropping work with neither DOI nor URL");
            continue;
        }
        let Some(year) = record.year() else {
            debug!("dropping work without a publication year");
            continue;
        };
        by_year.entry(year).or_default().push(record);
    }

    JournalWorks {
        container_title,
        by_year,
    }
}
