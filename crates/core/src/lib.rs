pub mod artifact;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod metrics;
pub mod normalizer;
pub mod query;
pub mod record;
pub mod refresh;
pub mod testing;

pub use artifact::{load_artifact, seed_from_artifact, write_artifact, ArtifactError, SeedError};
pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
    SharedSecretAuthenticator,
};
pub use catalog::{
    open_store, CatalogBackend, CatalogConfig, CatalogError, CatalogStats, CatalogStore,
    GenerationHandle, GenerationView, SnapshotCatalog, SqliteCatalog,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use crawler::{
    CancelSignal, CrawlError, CrawlState, Crawler, CrawlerConfig, FetchError, Fetcher,
    HttpFetcher, PageExtractor, ProductPodExtractor,
};
pub use normalizer::{normalize, NormalizationError};
pub use query::{Query, QueryEngine, QueryLimits, QueryRequest, QueryResult};
pub use record::{CatalogRecord, Generation, GenerationBuilder, GenerationInfo, RawEntry};
pub use refresh::{
    RefreshConfig, RefreshError, RefreshOrchestrator, RefreshOutcome, RefreshStatus,
};
