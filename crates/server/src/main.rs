use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfscan_core::{
    create_authenticator, load_config, open_store, seed_from_artifact, validate_config,
    Authenticator, Crawler, HttpFetcher, ProductPodExtractor, QueryEngine, RefreshOrchestrator,
};
use shelfscan_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SHELFSCAN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).context("Failed to serialize config")?;
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        auth = config.auth.method.as_str(),
        backend = config.catalog.backend.as_str(),
        "Configuration loaded"
    );

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Open the catalog store
    let store = open_store(&config.catalog, &config.database)
        .context("Failed to open catalog store")?;

    // Serve the last artifact until the first refresh lands
    if let Some(artifact_path) = &config.refresh.artifact_path {
        match seed_from_artifact(store.as_ref(), artifact_path) {
            Ok(Some(info)) => info!(
                generation = info.id,
                records = info.record_count,
                "Serving catalog from snapshot artifact"
            ),
            Ok(None) => {}
            Err(e) => warn!("Ignoring snapshot artifact: {}", e),
        }
    }

    // Build the crawl pipeline
    let fetcher = HttpFetcher::new(&config.crawler).context("Failed to create HTTP fetcher")?;
    let extractor = ProductPodExtractor::new(&config.crawler.selectors)
        .context("Invalid crawler selectors")?;
    let crawler = Crawler::new(
        config.crawler.clone(),
        Arc::new(fetcher),
        Arc::new(extractor),
    );
    info!(entry_url = %crawler.entry_url(), "Crawler configured");

    let orchestrator = Arc::new(RefreshOrchestrator::new(
        crawler,
        Arc::clone(&store),
        config.refresh.clone(),
    ));
    let engine = QueryEngine::new(store, config.catalog.limits());

    if config.refresh.refresh_on_startup {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            match orchestrator.refresh().await {
                Ok(outcome) => info!(outcome = outcome.label(), "Startup refresh finished"),
                Err(e) => warn!("Startup refresh skipped: {}", e),
            }
        });
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        engine,
        Arc::clone(&orchestrator),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    if orchestrator.cancel() {
        info!("Cancelled in-flight refresh");
    }
    info!("Server stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
