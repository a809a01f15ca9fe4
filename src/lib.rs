//! Journal article PDF batch downloader.
//!
//! Resolves article identifiers (DOIs, URLs, PMIDs, arXiv tags, or whole
//! journal year ranges via Crossref) to direct PDF links on a sci-hub mirror
//! and streams the files into per-batch directories, recording every article
//! it could not fetch in a per-batch `missing.log`.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`source`] - Query validation and identifier list expansion (.txt/.bib)
//! - [`metadata`] - Crossref works pagination for journal-mode queries
//! - [`resolver`] - Mirror page scraping: article page to direct PDF URL
//! - [`download`] - HTTP client, retry policy, streaming downloads
//! - [`executor`] - Sequential batch runner and missing-log bookkeeping
//! - [`commands`] - CLI command handlers

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod download;
pub mod executor;
pub mod metadata;
pub mod resolver;
pub mod source;

// Re-export commonly used types
pub use download::{
    DEFAULT_MAX_RETRIES, DownloadError, FailureType, HttpClient, RetryPolicy, classify_error,
};
pub use executor::{Batch, BatchReport, DownloadExecutor, DownloadTask, MissingLog};
pub use metadata::{CrossrefClient, JournalWorks, WorkRecord};
pub use resolver::{LinkOutcome, MirrorProtocol, MirrorResolver};
pub use source::{Identifier, JournalQuery, expand_identifiers};
