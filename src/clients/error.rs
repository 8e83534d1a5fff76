//! Error types for resource clients.

use thiserror::Error;

/// A call that never produced an HTTP response.
///
/// A 404 is *not* an error: it comes back as an [`ApiResponse`](super::ApiResponse)
/// so callers can assert on it. These variants cover calls that could not
/// be completed at all.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// The call did not complete within the configured per-call timeout.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Connection refused, reset, DNS failure, or any other IO-level error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The base URL or a path segment could not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
