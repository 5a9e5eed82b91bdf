//! Crawl loop: follows the pagination chain from the entry URL to its end.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::{
    CancelSignal, CrawlError, CrawlFailure, CrawlObserver, CrawlReport, CrawlState,
    CrawlerConfig, Fetcher, PageExtractor,
};
use crate::metrics::{FETCH_FAILURES, NORMALIZATION_FAILURES, PAGES_FETCHED};
use crate::normalizer::normalize;
use crate::record::GenerationBuilder;

/// Drives fetch → extract → normalize across the pagination chain.
///
/// A crawl is all-or-nothing: any fetch or page-level failure aborts it and
/// discards what was staged. Entry-level defects are counted and skipped.
pub struct Crawler {
    config: CrawlerConfig,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn PageExtractor>,
    observer: Option<CrawlObserver>,
}

impl Crawler {
    pub fn new(
        config: CrawlerConfig,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn PageExtractor>,
    ) -> Self {
        Self {
            config,
            fetcher,
            extractor,
            observer: None,
        }
    }

    /// Set a callback for state transitions.
    pub fn with_observer(mut self, observer: CrawlObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn entry_url(&self) -> &Url {
        &self.config.entry_url
    }

    /// Crawl the whole chain, checking `cancel` between pages.
    pub async fn crawl(&self, cancel: &CancelSignal) -> Result<CrawlReport, CrawlFailure> {
        let entry = self.config.entry_url.clone();
        info!(entry_url = %entry, "Starting crawl");

        let mut staged = GenerationBuilder::new().with_source_url(entry.as_str());
        let mut visited: HashSet<Url> = HashSet::new();
        let mut next = Some(entry);
        let mut pages_fetched = 0u32;
        let mut entries_seen = 0usize;
        let mut entries_skipped = 0usize;
        let mut normalization_failures = 0usize;
        let mut last_url = String::new();

        while let Some(url) = next.take() {
            if let Err(error) = self.before_fetch(&url, pages_fetched, &visited, cancel).await {
                return Err(self.fail(error, pages_fetched));
            }
            visited.insert(url.clone());
            last_url = url.to_string();

            let page_number = pages_fetched + 1;
            self.observe(CrawlState::Fetching {
                url: last_url.clone(),
                page: page_number,
            });

            let fetched = match self.fetcher.fetch(&url).await {
                Ok(page) if page.is_success() => page,
                Ok(page) => {
                    let error = super::FetchError::Status(page.status);
                    FETCH_FAILURES.with_label_values(&[error.kind()]).inc();
                    return Err(self.fail(
                        CrawlError::Fetch {
                            url: last_url,
                            source: error,
                        },
                        pages_fetched,
                    ));
                }
                Err(error) => {
                    FETCH_FAILURES.with_label_values(&[error.kind()]).inc();
                    return Err(self.fail(
                        CrawlError::Fetch {
                            url: last_url,
                            source: error,
                        },
                        pages_fetched,
                    ));
                }
            };
            pages_fetched = page_number;
            PAGES_FETCHED.inc();

            self.observe(CrawlState::Extracting {
                url: last_url.clone(),
                page: page_number,
            });

            let extracted = match self.extractor.extract(&fetched.body, &url) {
                Ok(extracted) => extracted,
                Err(source) => {
                    return Err(self.fail(
                        CrawlError::PageParse {
                            url: last_url,
                            source,
                        },
                        pages_fetched,
                    ));
                }
            };

            entries_seen += extracted.entries.len();
            entries_skipped += extracted.skipped;

            for entry in &extracted.entries {
                match normalize(entry, &url) {
                    Ok(record) => staged.push(record),
                    Err(e) => {
                        normalization_failures += 1;
                        NORMALIZATION_FAILURES.with_label_values(&[e.field()]).inc();
                        warn!(url = %url, field = e.field(), "Dropping entry: {}", e);
                    }
                }
            }

            debug!(
                url = %url,
                page = page_number,
                entries = extracted.entries.len(),
                staged = staged.len(),
                "Page processed"
            );

            next = extracted.next_page;
        }

        info!(
            pages = pages_fetched,
            records = staged.len(),
            normalization_failures,
            "Crawl complete"
        );
        self.observe(CrawlState::Done {
            pages: pages_fetched,
            records: staged.len(),
        });

        Ok(CrawlReport {
            staged,
            pages_fetched,
            entries_seen,
            entries_skipped,
            normalization_failures,
            last_url,
        })
    }

    /// Liveness checks and the inter-page delay, applied before each fetch.
    async fn before_fetch(
        &self,
        url: &Url,
        pages_fetched: u32,
        visited: &HashSet<Url>,
        cancel: &CancelSignal,
    ) -> Result<(), CrawlError> {
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled {
                url: Some(url.to_string()),
            });
        }

        if visited.contains(url) {
            return Err(CrawlError::PaginationCycle {
                url: url.to_string(),
            });
        }

        if pages_fetched >= self.config.max_pages {
            return Err(CrawlError::PageLimitExceeded {
                limit: self.config.max_pages,
                url: url.to_string(),
            });
        }

        if pages_fetched > 0 && self.config.request_delay_ms > 0 {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(CrawlError::Cancelled {
                        url: Some(url.to_string()),
                    });
                }
                _ = tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)) => {}
            }
        }

        Ok(())
    }

    fn fail(&self, error: CrawlError, pages_fetched: u32) -> CrawlFailure {
        warn!(pages_fetched, "Crawl aborted: {}", error);
        self.observe(CrawlState::Failed {
            url: error.last_url().map(str::to_string),
            reason: error.to_string(),
        });
        CrawlFailure {
            error,
            pages_fetched,
        }
    }

    fn observe(&self, state: CrawlState) {
        if let Some(observer) = &self.observer {
            observer(&state);
        }
    }
}
