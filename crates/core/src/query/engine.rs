//! Query engine: the read path shared by every serving surface.

use std::sync::Arc;

use tracing::debug;

use super::{Query, QueryLimits, QueryRequest, QueryResult};
use crate::catalog::{CatalogError, CatalogStats, CatalogStore, GenerationHandle};
use crate::record::CatalogRecord;

/// Answers queries against whatever generation is published when the
/// request arrives.
///
/// Each call takes one [`GenerationHandle`] and does all of its work against
/// it, so a publish racing with a query never mixes generations.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn CatalogStore>,
    limits: QueryLimits,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn CatalogStore>, limits: QueryLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Run a caller query: defaults are filled and bounds clamped first.
    pub fn search(&self, request: QueryRequest) -> Result<QueryResult, CatalogError> {
        self.execute(&request.into_query(&self.limits))
    }

    /// Run a query against the current generation.
    pub fn execute(&self, query: &Query) -> Result<QueryResult, CatalogError> {
        let query = query.clone().normalized(&self.limits);
        let handle = self.store.current()?;
        let result = handle.execute(&query)?;

        debug!(
            generation = result.generation,
            total = result.total,
            page = result.page,
            "Query executed"
        );
        Ok(result)
    }

    /// Look up one record by id.
    pub fn lookup(&self, id: &str) -> Result<CatalogRecord, CatalogError> {
        self.store.current()?.get(id)
    }

    /// Pin the current generation for several reads.
    pub fn snapshot(&self) -> Result<GenerationHandle, CatalogError> {
        self.store.current()
    }

    pub fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let handle = self.store.current()?;
        let summary = handle.summary()?;
        let info = handle.info();

        Ok(CatalogStats {
            generation: info.id,
            record_count: summary.record_count,
            in_stock_count: summary.in_stock_count,
            price_min: summary.price_min,
            price_max: summary.price_max,
            published_at: info.published_at,
            backend: self.store.backend_name().to_string(),
        })
    }
}
