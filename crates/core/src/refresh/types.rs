//! Types for the refresh orchestrator.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::crawler::CrawlState;
use crate::record::{DuplicateRecord, GenerationInfo};

/// Refresh configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Where to write the snapshot artifact after each publish (disabled if unset).
    #[serde(default)]
    pub artifact_path: Option<PathBuf>,

    /// Start a refresh in the background as soon as the server is up.
    #[serde(default)]
    pub refresh_on_startup: bool,
}

/// Errors that prevent a refresh from reporting an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// Another refresh is already running.
    #[error("a refresh is already in progress (run {run_id})")]
    InProgress { run_id: Uuid },

    /// The task running the refresh panicked before reporting an outcome.
    #[error("refresh task failed: {0}")]
    TaskFailed(String),
}

/// What a successful refresh published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub run_id: Uuid,
    /// The newly published generation.
    pub generation: GenerationInfo,
    pub pages_fetched: u32,
    pub entries_seen: usize,
    pub entries_skipped: usize,
    pub normalization_failures: usize,
    /// Records dropped at seal time for repeating a detail URL.
    pub duplicates: Vec<DuplicateRecord>,
    /// Set when the snapshot artifact could not be written; the publish
    /// itself still succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Why a refresh left the catalog untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshFailure {
    pub run_id: Uuid,
    /// Page the crawl was on when it stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_url: Option<String>,
    pub cause: String,
    pub pages_fetched: u32,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Result of a refresh that was allowed to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Published(RefreshSummary),
    Failed(RefreshFailure),
}

impl RefreshOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published(_))
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Published(_) => "published",
            Self::Failed(_) => "failed",
        }
    }
}

/// Snapshot of the orchestrator for status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Latest crawler state (`idle` between runs).
    pub crawl_state: CrawlState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<RefreshOutcome>,
    /// Refreshes that ran to an outcome since startup.
    pub refreshes_total: u64,
}
