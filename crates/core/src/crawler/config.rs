//! Crawler configuration.

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the catalog crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// First listing page of the pagination chain.
    #[serde(default = "default_entry_url")]
    pub entry_url: Url,

    /// Delay between consecutive page fetches (milliseconds).
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of pages a single crawl may fetch.
    /// Exceeding it aborts the crawl.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// CSS selectors used by the listing extractor.
    #[serde(default)]
    pub selectors: SelectorConfig,
}

fn default_entry_url() -> Url {
    Url::parse("https://books.toscrape.com/").expect("default entry URL is valid")
}

fn default_request_delay() -> u64 {
    300
}

fn default_timeout() -> u64 {
    30
}

fn default_max_pages() -> u32 {
    1000
}

fn default_user_agent() -> String {
    format!("shelfscan/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            entry_url: default_entry_url(),
            request_delay_ms: default_request_delay(),
            timeout_secs: default_timeout(),
            max_pages: default_max_pages(),
            user_agent: default_user_agent(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// CSS selectors for the product listing markup.
///
/// Entry-relative selectors (`title_link`, `price`, ...) are evaluated inside
/// each element matched by `entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Container every listing page must have.
    pub listing: String,
    /// One element per catalog entry.
    pub entry: String,
    /// Link carrying the title (`title` attribute) and detail href.
    pub title_link: String,
    pub price: String,
    pub availability: String,
    /// Element whose `class` attribute carries the rating word.
    pub rating: String,
    pub thumbnail: String,
    /// Link to the next listing page.
    pub next_page: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing: "ol.row".to_string(),
            entry: "article.product_pod".to_string(),
            title_link: "h3 a".to_string(),
            price: ".price_color".to_string(),
            availability: ".availability".to_string(),
            rating: ".star-rating".to_string(),
            thumbnail: ".image_container img".to_string(),
            next_page: "li.next a".to_string(),
        }
    }
}
