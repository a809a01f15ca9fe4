//! HTTP client wrapper shared by every network-facing component.
//!
//! One [`HttpClient`] is constructed at startup and injected into the
//! metadata paginator, link resolver, and download executor (no module-level
//! session state). It centralizes timeout policy, the User-Agent header, and
//! a uniform response surface: text bodies, JSON, and streaming downloads.
//!
//! Mirror pages are fetched with redirects disallowed ([`HttpClient::get_page`]),
//! matching the scrape contract; API calls and PDF fetches follow redirects.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, redirect};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::error::DownloadError;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 60;

/// Browser-like User-Agent sent on every request.
///
/// The mirror serves different markup to obvious bots; a browser UA keeps the
/// scraped page shape consistent with what the extraction strategies expect.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// HTTP client with timeout, cookie, and streaming-download support.
///
/// Designed to be created once and reused for the whole run, taking advantage
/// of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Follows redirects; used for API calls and PDF fetches.
    client: Client,
    /// Redirects disallowed; used for mirror page fetches.
    page_client: Client,
}

impl HttpClient {
    /// Creates a new client with project-standard timeouts and headers.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, DownloadError> {
        let client = base_builder()
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        let page_client = base_builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self {
            client,
            page_client,
        })
    }

    /// GETs `url` and returns the response body as text.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network failure or non-2xx status.
    #[instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))
    }

    /// GETs `url` with redirects disallowed and returns the body as text.
    ///
    /// A redirect status (3xx) is reported as [`DownloadError::HttpStatus`],
    /// the same as any other non-2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network failure or non-2xx status.
    #[instrument(skip(self))]
    pub async fn get_page(&self, url: &str) -> Result<String, DownloadError> {
        let response = self
            .page_client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))
    }

    /// POSTs a form body to `url` and returns the response body as text.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network failure or non-2xx status.
    #[instrument(skip(self, form))]
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<String, DownloadError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))
    }

    /// GETs `url` and deserializes the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network failure, non-2xx status, or a
    /// body that does not match `T`.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))
    }

    /// Streams the body of `url` to `dest`, chunk by chunk.
    ///
    /// A partially written file is removed on failure so the exists-check in
    /// the executor never mistakes a truncated download for a finished one.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network failure, non-2xx status, or any
    /// file-system error.
    #[instrument(skip(self), fields(dest = %dest.display()))]
    pub async fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_written = 0u64;

        while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = tokio::fs::remove_file(dest).await;
                    return Err(DownloadError::network(url, e));
                }
            };
            if let Err(e) = writer.write_all(&chunk).await {
                let _ = tokio::fs::remove_file(dest).await;
                return Err(DownloadError::io(dest, e));
            }
            bytes_written += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        debug!(bytes_written, "download complete");
        Ok(bytes_written)
    }
}

fn base_builder() -> reqwest::ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .gzip(true)
}
