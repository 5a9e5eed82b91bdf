//! Types for the catalog crawler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Notify;
use url::Url;

use crate::record::{GenerationBuilder, RawEntry};

/// Content returned by the fetch collaborator for one URL.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl FetchedPage {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors raised while fetching a page.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection(_) => "connection",
            Self::Status(_) => "status",
            Self::Body(_) => "body",
            Self::Client(_) => "client",
        }
    }
}

/// A page that could not be parsed as a listing page.
#[derive(Debug, Clone, Error)]
pub enum PageParseError {
    #[error("page content is empty")]
    Empty,

    #[error("listing container `{0}` not found")]
    MissingListing(String),

    #[error("next page locator `{href}` cannot be resolved: {reason}")]
    InvalidNextLocator { href: String, reason: String },
}

/// Entries and pagination found on one listing page.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Raw entries in page order.
    pub entries: Vec<RawEntry>,
    /// Absolute URL of the next page, if any.
    pub next_page: Option<Url>,
    /// Entry elements skipped as malformed.
    pub skipped: usize,
}

/// Why a crawl stopped before reaching the end of the pagination chain.
#[derive(Debug, Clone, Error)]
pub enum CrawlError {
    #[error("failed to fetch {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("failed to parse {url}: {source}")]
    PageParse { url: String, source: PageParseError },

    #[error("pagination cycle detected: {url} was already visited")]
    PaginationCycle { url: String },

    #[error("page limit of {limit} exceeded before {url}")]
    PageLimitExceeded { limit: u32, url: String },

    #[error("crawl cancelled")]
    Cancelled { url: Option<String> },
}

impl CrawlError {
    /// The URL the crawl was working on when it stopped.
    pub fn last_url(&self) -> Option<&str> {
        match self {
            Self::Fetch { url, .. }
            | Self::PageParse { url, .. }
            | Self::PaginationCycle { url }
            | Self::PageLimitExceeded { url, .. } => Some(url),
            Self::Cancelled { url } => url.as_deref(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// A failed crawl plus how far it got.
#[derive(Debug, Clone, Error)]
#[error("{error} (after {pages_fetched} pages)")]
pub struct CrawlFailure {
    pub error: CrawlError,
    pub pages_fetched: u32,
}

/// Records and counters from a completed crawl.
#[derive(Debug)]
pub struct CrawlReport {
    /// Normalized records, staged in crawl order.
    pub staged: GenerationBuilder,
    pub pages_fetched: u32,
    /// Raw entries handed to the normalizer.
    pub entries_seen: usize,
    /// Entry elements the extractor skipped as malformed.
    pub entries_skipped: usize,
    /// Raw entries the normalizer rejected.
    pub normalization_failures: usize,
    /// Last page fetched.
    pub last_url: String,
}

/// Crawler state machine, reported to observers as it advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CrawlState {
    Idle,
    Fetching { url: String, page: u32 },
    Extracting { url: String, page: u32 },
    Done { pages: u32, records: usize },
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        reason: String,
    },
}

/// Callback invoked on every crawler state transition.
pub type CrawlObserver = Arc<dyn Fn(&CrawlState) + Send + Sync>;

/// Cooperative cancellation flag shared between the orchestrator and a crawl.
#[derive(Debug, Default)]
pub struct CancelSignal {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake anything waiting on it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation so the signal can be reused.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fetched_page_success_range() {
        assert!(FetchedPage::ok("x").is_success());
        assert!(!FetchedPage {
            status: 404,
            body: String::new()
        }
        .is_success());
        assert!(!FetchedPage {
            status: 301,
            body: String::new()
        }
        .is_success());
    }

    #[test]
    fn test_crawl_error_last_url() {
        let err = CrawlError::Fetch {
            url: "https://example.com/page-2.html".to_string(),
            source: FetchError::Status(503),
        };
        assert_eq!(err.last_url(), Some("https://example.com/page-2.html"));
        assert_eq!(
            err.to_string(),
            "failed to fetch https://example.com/page-2.html: unexpected HTTP status 503"
        );

        let err = CrawlError::Cancelled { url: None };
        assert!(err.is_cancelled());
        assert_eq!(err.last_url(), None);
    }

    #[test]
    fn test_crawl_state_serialization() {
        let state = CrawlState::Fetching {
            url: "https://example.com/".to_string(),
            page: 1,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "fetching");
        assert_eq!(json["page"], 1);

        let json = serde_json::to_string(&CrawlState::Idle).unwrap();
        assert_eq!(json, r#"{"state":"idle"}"#);
    }

    #[tokio::test]
    async fn test_cancel_signal_wakes_waiter() {
        let signal = Arc::new(CancelSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(signal.is_cancelled());

        signal.reset();
        assert!(!signal.is_cancelled());
    }
}
