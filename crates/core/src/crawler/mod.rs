//! Catalog crawler.
//!
//! Walks a paginated listing from its entry URL: each page is fetched,
//! handed to a [`PageExtractor`], and its entries normalized into
//! [`CatalogRecord`](crate::record::CatalogRecord)s staged for the next
//! generation. The crawl ends when a page has no next locator.

mod config;
mod extractor;
mod fetcher;
mod runner;
mod types;

pub use config::{CrawlerConfig, SelectorConfig};
pub use extractor::{PageExtractor, ProductPodExtractor, SelectorError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use runner::Crawler;
pub use types::{
    CancelSignal, CrawlError, CrawlFailure, CrawlObserver, CrawlReport, CrawlState, ExtractedPage,
    FetchError, FetchedPage, PageParseError,
};
