//! Mock fetcher for testing.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::crawler::{FetchError, FetchedPage, Fetcher};

/// Mock implementation of the Fetcher trait.
///
/// Serves scripted responses keyed by absolute URL:
/// - `set_page` / `set_response` configure what a URL returns
/// - `fail_url` makes a URL fail with a fetch error
/// - `set_delay` slows every fetch down
/// - `requested_urls` records what was fetched, in order
///
/// Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: RwLock<HashMap<String, Result<FetchedPage, FetchError>>>,
    requests: RwLock<Vec<String>>,
    delay: RwLock<Option<Duration>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for `url`.
    pub fn set_page(&self, url: &str, body: impl Into<String>) {
        self.set_response(url, 200, body);
    }

    /// Serve `body` with the given status for `url`.
    pub fn set_response(&self, url: &str, status: u16, body: impl Into<String>) {
        self.responses.write().unwrap().insert(
            url.to_string(),
            Ok(FetchedPage {
                status,
                body: body.into(),
            }),
        );
    }

    /// Make fetches of `url` fail with `error`.
    pub fn fail_url(&self, url: &str, error: FetchError) {
        self.responses
            .write()
            .unwrap()
            .insert(url.to_string(), Err(error));
    }

    /// Remove every scripted response.
    pub fn clear(&self) {
        self.responses.write().unwrap().clear();
    }

    /// Delay applied before every response.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write().unwrap() = Some(delay);
    }

    /// URLs fetched so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    pub fn clear_requests(&self) {
        self.requests.write().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.requests.write().unwrap().push(url.to_string());

        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .read()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| {
                Ok(FetchedPage {
                    status: 404,
                    body: String::new(),
                })
            })
    }
}
