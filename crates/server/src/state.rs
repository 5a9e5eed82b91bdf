use std::sync::Arc;

use shelfscan_core::{Authenticator, Config, QueryEngine, RefreshOrchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    engine: QueryEngine,
    orchestrator: Arc<RefreshOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        engine: QueryEngine,
        orchestrator: Arc<RefreshOrchestrator>,
    ) -> Self {
        Self {
            config,
            authenticator,
            engine,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn orchestrator(&self) -> &Arc<RefreshOrchestrator> {
        &self.orchestrator
    }
}
