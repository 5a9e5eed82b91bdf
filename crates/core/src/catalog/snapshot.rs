//! In-process snapshot catalog.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::debug;

use super::{
    CatalogError, CatalogStore, GenerationHandle, GenerationSummary, GenerationView,
};
use crate::query::{Filter, Query, QueryResult};
use crate::record::{CatalogRecord, Generation, GenerationInfo};

/// A published generation held in memory, indexed by record id.
struct PublishedSnapshot {
    info: GenerationInfo,
    generation: Generation,
    by_id: HashMap<String, usize>,
}

impl PublishedSnapshot {
    fn new(info: GenerationInfo, generation: Generation) -> Self {
        let by_id = generation
            .records()
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id.clone(), position))
            .collect();
        Self {
            info,
            generation,
            by_id,
        }
    }

    fn empty() -> Self {
        Self::new(GenerationInfo::empty(), Generation::empty())
    }
}

impl GenerationView for PublishedSnapshot {
    fn info(&self) -> &GenerationInfo {
        &self.info
    }

    fn execute(&self, query: &Query) -> Result<QueryResult, CatalogError> {
        let filter = Filter::from_query(query);
        let offset = query.offset();
        let limit = query.limit as usize;

        // One pass: count every match, keep the ones that land on this page.
        let mut total = 0u64;
        let mut items = Vec::with_capacity(limit.min(self.generation.len()));
        for record in self.generation.records() {
            if !filter.matches(record) {
                continue;
            }
            if total >= offset && items.len() < limit {
                items.push(record.clone());
            }
            total += 1;
        }

        Ok(QueryResult {
            total,
            page: query.page,
            limit: query.limit,
            items,
            generation: self.info.id,
        })
    }

    fn get(&self, id: &str) -> Result<CatalogRecord, CatalogError> {
        self.by_id
            .get(id)
            .and_then(|&position| self.generation.records().get(position))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    fn summary(&self) -> Result<GenerationSummary, CatalogError> {
        let records = self.generation.records();
        let prices = records.iter().map(|r| r.price);
        Ok(GenerationSummary {
            record_count: records.len() as u64,
            in_stock_count: records.iter().filter(|r| r.in_stock).count() as u64,
            price_min: prices.clone().reduce(f64::min),
            price_max: prices.reduce(f64::max),
        })
    }
}

/// Catalog kept entirely in memory.
///
/// Publishing swaps the `Arc` behind a lock; readers clone the `Arc` and
/// query it without holding the lock. A replaced generation is freed when
/// its last handle drops.
pub struct SnapshotCatalog {
    current: RwLock<Arc<PublishedSnapshot>>,
}

impl SnapshotCatalog {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(PublishedSnapshot::empty())),
        }
    }
}

impl Default for SnapshotCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for SnapshotCatalog {
    fn publish(&self, generation: Generation) -> Result<GenerationInfo, CatalogError> {
        let mut info = GenerationInfo {
            id: 0,
            record_count: generation.len(),
            sealed_at: generation.sealed_at(),
            published_at: None,
            source_url: generation.source_url().map(str::to_string),
        };
        let mut snapshot = PublishedSnapshot::new(info.clone(), generation);

        let mut current = self
            .current
            .write()
            .map_err(|_| CatalogError::Internal("snapshot lock poisoned".to_string()))?;

        info.id = current.info.id + 1;
        info.published_at = Some(Utc::now());
        snapshot.info = info.clone();
        *current = Arc::new(snapshot);

        debug!(generation = info.id, records = info.record_count, "Snapshot swapped");
        Ok(info)
    }

    fn current(&self) -> Result<GenerationHandle, CatalogError> {
        let current = self
            .current
            .read()
            .map_err(|_| CatalogError::Internal("snapshot lock poisoned".to_string()))?;
        let handle: GenerationHandle = Arc::clone(&*current) as GenerationHandle;
        Ok(handle)
    }

    fn backend_name(&self) -> &'static str {
        "snapshot"
    }
}
