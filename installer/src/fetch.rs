//! HTTP retrieval for release metadata and editor archives.
//!
//! Provides a trait-based abstraction over the two kinds of request the
//! provisioning pipeline makes, enabling dependency injection for testing.
//! Every failure mode (transport error, timeout, non-2xx status) collapses
//! into a single [`FetchError`], because callers react identically to all of
//! them.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Timeout for JSON documents (compatibility map and release metadata).
pub const JSON_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for archive bodies, which are considerably larger.
pub const BINARY_TIMEOUT: Duration = Duration::from_secs(12);

/// Trait for fetching remote content, enabling test mocking.
///
/// # Examples
///
/// ```
/// use editor_installer::fetch::HttpFetcher;
///
/// let fetcher = HttpFetcher;
/// // Use fetcher.fetch_json("https://...") in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ContentFetcher {
    /// Fetch a small document and return its body bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails, times out, or the server
    /// answers with a non-2xx status.
    fn fetch_json(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Fetch a binary body and return a reader over it.
    ///
    /// The body is streamed; nothing is buffered beyond what the reader
    /// consumes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails, times out, or the server
    /// answers with a non-2xx status.
    fn fetch_binary(&self, url: &str) -> Result<Box<dyn Read>, FetchError>;
}

/// A failed fetch, whatever the cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch failed for {url}: {reason}")]
pub struct FetchError {
    /// The URL that was requested.
    pub url: String,
    /// A human-readable description of the failure.
    pub reason: String,
}

impl FetchError {
    /// Build a fetch error for `url` from any displayable cause.
    #[must_use]
    pub fn new(url: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl ContentFetcher for HttpFetcher {
    fn fetch_json(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = json_agent()
            .get(url)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_vec()
            .map_err(|e| map_ureq_error(url, &e))
    }

    fn fetch_binary(&self, url: &str) -> Result<Box<dyn Read>, FetchError> {
        let response = binary_agent()
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        Ok(Box::new(response.into_body().into_reader()))
    }
}

/// Shared agent for JSON requests.
fn json_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| agent_with_timeout(JSON_TIMEOUT))
}

/// Shared agent for archive downloads.
fn binary_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| agent_with_timeout(BINARY_TIMEOUT))
}

fn agent_with_timeout(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(code) => FetchError::new(url, format!("HTTP status {code}")),
        other => FetchError::new(url, other),
    }
}
