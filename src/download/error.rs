//! Error types for the download module.
//!
//! Structured errors for all outbound HTTP operations, carrying the URL or
//! path context the bare `reqwest`/`std::io` errors lack.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the network or writing files.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client itself could not be constructed (TLS backend init).
    #[error("failed to construct HTTP client: {source}")]
    ClientBuild {
        /// The underlying construction error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Maps a `reqwest::Error` into the matching variant, preserving `url` context.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if let Some(status) = source.status() {
            Self::HttpStatus {
                url,
                status: status.as_u16(),
            }
        } else {
            Self::Network { url, source }
        }
    }
}

// No `From<reqwest::Error>`/`From<std::io::Error>` impls: every variant needs
// the URL or path context the source errors do not carry, so callers go
// through the helper constructors instead.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_contains_url() {
        let error = DownloadError::timeout("https://example.com/file.pdf");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/file.pdf"));
    }

    #[test]
    fn test_http_status_display() {
        let error = DownloadError::http_status("https://example.com/file.pdf", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/file.pdf"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_io_display_contains_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/test.pdf"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/test.pdf"), "Expected path in: {msg}");
    }

    #[test]
    fn test_invalid_url_display() {
        let error = DownloadError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }
}
