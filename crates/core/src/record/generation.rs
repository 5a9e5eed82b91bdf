//! Generations: staged, sealed and published record sets.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::CatalogRecord;

/// A duplicate dropped while sealing a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRecord {
    /// Detail URL shared with an earlier record.
    pub detail_url: String,
    /// Title of the dropped (later) record.
    pub title: String,
}

/// Staging area a crawl fills while it runs.
///
/// Nothing staged is visible to readers; the builder must be sealed into a
/// [`Generation`] and published through a catalog store first.
#[derive(Debug, Default)]
pub struct GenerationBuilder {
    records: Vec<CatalogRecord>,
    source_url: Option<String>,
}

impl GenerationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the entry URL the crawl started from.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn push(&mut self, record: CatalogRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = CatalogRecord>) {
        self.records.extend(records);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Seal the staged records into an immutable generation.
    ///
    /// Later records whose detail URL (or derived id) was already seen are
    /// dropped and reported; crawl order is otherwise preserved.
    pub fn seal(self) -> (Generation, Vec<DuplicateRecord>) {
        let mut seen_urls = HashSet::with_capacity(self.records.len());
        let mut seen_ids = HashSet::with_capacity(self.records.len());
        let mut kept = Vec::with_capacity(self.records.len());
        let mut duplicates = Vec::new();

        for record in self.records {
            if seen_urls.contains(&record.detail_url) || seen_ids.contains(&record.id) {
                warn!(
                    detail_url = %record.detail_url,
                    title = %record.title,
                    "Dropping duplicate catalog record"
                );
                duplicates.push(DuplicateRecord {
                    detail_url: record.detail_url,
                    title: record.title,
                });
                continue;
            }
            seen_urls.insert(record.detail_url.clone());
            seen_ids.insert(record.id.clone());
            kept.push(record);
        }

        let generation = Generation {
            records: Arc::from(kept),
            sealed_at: Utc::now(),
            source_url: self.source_url,
        };
        (generation, duplicates)
    }
}

/// An immutable, fully formed record set produced by one crawl.
#[derive(Debug, Clone)]
pub struct Generation {
    records: Arc<[CatalogRecord]>,
    sealed_at: DateTime<Utc>,
    source_url: Option<String>,
}

impl Generation {
    /// The empty generation served before any crawl has been published.
    pub fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            sealed_at: Utc::now(),
            source_url: None,
        }
    }

    /// Seal an arbitrary record list (deduplicating as a crawl would).
    pub fn from_records(records: Vec<CatalogRecord>) -> (Self, Vec<DuplicateRecord>) {
        let mut builder = GenerationBuilder::new();
        builder.extend(records);
        builder.seal()
    }

    /// Override the seal timestamp (used when restoring a persisted generation).
    pub fn with_sealed_at(mut self, sealed_at: DateTime<Utc>) -> Self {
        self.sealed_at = sealed_at;
        self
    }

    pub fn with_source_url(mut self, source_url: Option<String>) -> Self {
        self.source_url = source_url;
        self
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sealed_at(&self) -> DateTime<Utc> {
        self.sealed_at
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }
}

/// Description of a published generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInfo {
    /// Monotonic generation id assigned at publish time (0 = never populated).
    pub id: u64,
    /// Number of records in the generation.
    pub record_count: usize,
    /// When the generation was sealed.
    pub sealed_at: DateTime<Utc>,
    /// When the generation became visible (None for the initial empty one).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Entry URL the crawl started from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl GenerationInfo {
    pub fn empty() -> Self {
        Self {
            id: 0,
            record_count: 0,
            sealed_at: Utc::now(),
            published_at: None,
            source_url: None,
        }
    }
}
