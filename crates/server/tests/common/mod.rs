//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a scripted fetcher injected, so refreshes run against canned listing
//! pages without network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

use shelfscan_core::{
    config::{AuthConfig, DatabaseConfig, ServerConfig},
    crawler::SelectorConfig,
    create_authenticator,
    testing::MockFetcher,
    AuthMethod, CatalogBackend, CatalogConfig, CatalogStore, Config, Crawler, CrawlerConfig,
    ProductPodExtractor, QueryEngine, RefreshConfig, RefreshOrchestrator, SnapshotCatalog,
    SqliteCatalog,
};

/// Re-export fixtures for test convenience
pub use shelfscan_core::testing::fixtures;

/// Entry page every fixture crawls from.
pub const ENTRY_URL: &str = "https://shop.test/catalogue/page-1.html";

/// Secret used when a fixture is built with [`TestConfig::with_secret`].
pub const TEST_SECRET: &str = "open-sesame";

/// Test fixture for E2E testing with a mock fetcher.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_listing() {
///     let fixture = TestFixture::new().await;
///     fixture.serve_pages(&[vec![fixtures::ListingEntry::new("Dune", "dune/index.html", "£9.00", "Four", true)]]);
///
///     let response = fixture.post("/api/v1/refresh", json!({})).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - script listing pages
    pub fetcher: Arc<MockFetcher>,
    /// Orchestrator behind the refresh routes
    pub orchestrator: Arc<RefreshOrchestrator>,
    /// Temporary directory for the database and artifact
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let fetcher = Arc::new(MockFetcher::new());

        let config = Config {
            auth: AuthConfig {
                method: if test_config.secret.is_some() {
                    AuthMethod::SharedSecret
                } else {
                    AuthMethod::None
                },
                secret: test_config.secret.clone(),
            },
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            catalog: CatalogConfig {
                backend: test_config.backend,
                ..Default::default()
            },
            crawler: CrawlerConfig {
                entry_url: Url::parse(ENTRY_URL).expect("valid entry url"),
                request_delay_ms: 0,
                ..Default::default()
            },
            refresh: RefreshConfig {
                artifact_path: Some(temp_dir.path().join("catalog.json")),
                refresh_on_startup: false,
            },
        };

        let store: Arc<dyn CatalogStore> = match test_config.backend {
            CatalogBackend::Snapshot => Arc::new(SnapshotCatalog::new()),
            CatalogBackend::Sqlite => {
                Arc::new(SqliteCatalog::new(&db_path).expect("Failed to create catalog"))
            }
        };

        let crawler = Crawler::new(
            config.crawler.clone(),
            Arc::clone(&fetcher) as Arc<dyn shelfscan_core::Fetcher>,
            Arc::new(
                ProductPodExtractor::new(&SelectorConfig::default())
                    .expect("default selectors parse"),
            ),
        );
        let orchestrator = Arc::new(RefreshOrchestrator::new(
            crawler,
            Arc::clone(&store),
            config.refresh.clone(),
        ));

        let authenticator = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );
        let engine = QueryEngine::new(store, config.catalog.limits());

        let state = Arc::new(shelfscan_server::state::AppState::new(
            config,
            authenticator,
            engine,
            Arc::clone(&orchestrator),
        ));

        let router = shelfscan_server::api::create_router(state);

        Self {
            router,
            fetcher,
            orchestrator,
            temp_dir,
        }
    }

    /// Script a pagination chain: page `n` links to page `n + 1`.
    pub fn serve_pages(&self, pages: &[Vec<fixtures::ListingEntry>]) {
        for (i, entries) in pages.iter().enumerate() {
            let next = (i + 1 < pages.len()).then(|| format!("page-{}.html", i + 2));
            self.fetcher.set_page(
                &page_url(i + 1),
                fixtures::listing_page(entries, next.as_deref()),
            );
        }
    }

    /// Slow every fetch down so a refresh stays in flight.
    pub fn slow_fetches(&self, delay: Duration) {
        self.fetcher.set_delay(delay);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, &[]).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path, &[]).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, &[]).await
    }

    /// Send a request with extra headers.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }
        let request = request_builder.body(Body::empty()).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// URL of listing page `n` in the scripted chain.
pub fn page_url(n: usize) -> String {
    format!("https://shop.test/catalogue/page-{}.html", n)
}

/// Listing entries matching `fixtures::mixed_records()`.
pub fn mixed_entries() -> Vec<fixtures::ListingEntry> {
    vec![
        fixtures::ListingEntry::new("A Light in the Attic", "a-light-in-the-attic_1000/index.html", "£51.77", "Three", true),
        fixtures::ListingEntry::new("Tipping the Velvet", "tipping-the-velvet_999/index.html", "£13.99", "One", true),
        fixtures::ListingEntry::new("Soumission", "soumission_998/index.html", "£20.00", "Four", false),
        fixtures::ListingEntry::new("Sharp Objects", "sharp-objects_997/index.html", "£29.99", "Four", true),
        fixtures::ListingEntry::new("Sapiens", "sapiens_996/index.html", "£24.99", "Five", true),
    ]
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Catalog backend behind the engine
    pub backend: CatalogBackend,
    /// Shared secret gating refresh (none when unset)
    pub secret: Option<String>,
}

impl TestConfig {
    /// Snapshot backend, no auth.
    pub fn snapshot() -> Self {
        Self {
            backend: CatalogBackend::Snapshot,
            secret: None,
        }
    }

    /// SQLite backend with the refresh routes gated by [`TEST_SECRET`].
    pub fn with_secret() -> Self {
        Self {
            backend: CatalogBackend::Sqlite,
            secret: Some(TEST_SECRET.to_string()),
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
