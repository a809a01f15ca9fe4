//! HTTP transport layer: client wrapper, error types, and retry policy.
//!
//! Everything that touches the network goes through [`HttpClient`], and
//! every call site wraps its request in [`retrying`] so transient failures
//! (timeouts, resets, 5xx) are re-attempted with a fixed delay before
//! surfacing to the caller.

mod client;
mod error;
mod retry;

pub use client::{HttpClient, USER_AGENT};
pub use error::DownloadError;
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryPolicy, classify_error, retrying};
