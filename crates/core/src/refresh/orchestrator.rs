//! Refresh orchestrator: crawl, seal, publish.
//!
//! At most one refresh runs at a time; a second request is rejected rather
//! than queued. Each refresh runs on its own task, so dropping the caller's
//! future does not stop it; only [`RefreshOrchestrator::cancel`] does.
//! Whatever happens during the crawl, the published generation only changes
//! through a successful [`CatalogStore::publish`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    RefreshConfig, RefreshError, RefreshFailure, RefreshOutcome, RefreshStatus, RefreshSummary,
};
use crate::artifact::write_artifact;
use crate::catalog::CatalogStore;
use crate::crawler::{CancelSignal, CrawlFailure, CrawlReport, CrawlState, Crawler};
use crate::metrics::{DUPLICATES_DROPPED, PUBLISHED_RECORDS, REFRESHES, REFRESH_DURATION};

/// The refresh currently in flight.
#[derive(Clone)]
struct ActiveRun {
    id: Uuid,
    started_at: DateTime<Utc>,
    cancel: Arc<CancelSignal>,
}

#[derive(Default)]
struct Progress {
    crawl_state: Option<CrawlState>,
    last_outcome: Option<RefreshOutcome>,
}

/// Clears the active run when the refresh finishes, however it finishes.
struct RunGuard {
    inner: Arc<Inner>,
    run: ActiveRun,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        *self.inner.active() = None;
    }
}

/// Drives full catalog refreshes.
pub struct RefreshOrchestrator {
    inner: Arc<Inner>,
}

/// State shared between the orchestrator and its refresh tasks.
struct Inner {
    crawler: Crawler,
    store: Arc<dyn CatalogStore>,
    config: RefreshConfig,
    active: Mutex<Option<ActiveRun>>,
    progress: Arc<RwLock<Progress>>,
    refreshes_total: AtomicU64,
}

impl RefreshOrchestrator {
    pub fn new(crawler: Crawler, store: Arc<dyn CatalogStore>, config: RefreshConfig) -> Self {
        let progress = Arc::new(RwLock::new(Progress::default()));

        let sink = Arc::clone(&progress);
        let crawler = crawler.with_observer(Arc::new(move |state: &CrawlState| {
            if let Ok(mut progress) = sink.write() {
                progress.crawl_state = Some(state.clone());
            }
        }));

        Self {
            inner: Arc::new(Inner {
                crawler,
                store,
                config,
                active: Mutex::new(None),
                progress,
                refreshes_total: AtomicU64::new(0),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.inner.store
    }

    /// Run one full refresh and wait for its outcome.
    ///
    /// Returns [`RefreshError::InProgress`] if another refresh is running.
    /// Crawl and publish failures are reported as
    /// [`RefreshOutcome::Failed`] and leave the published generation as it was.
    /// The refresh keeps running if this future is dropped; its outcome is
    /// still recorded in [`RefreshOrchestrator::status`].
    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let guard = Inner::begin(&self.inner)?;
        let run_id = guard.run.id;

        let task = tokio::spawn(Inner::run(guard));
        task.await.map_err(|e| {
            error!(run_id = %run_id, "Refresh task failed: {}", e);
            RefreshError::TaskFailed(e.to_string())
        })
    }

    /// Request cancellation of the running refresh.
    ///
    /// Returns false when nothing was running.
    pub fn cancel(&self) -> bool {
        match self.inner.active().as_ref() {
            Some(run) => {
                info!(run_id = %run.id, "Refresh cancellation requested");
                run.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.active().is_some()
    }

    pub fn status(&self) -> RefreshStatus {
        let run = self.inner.active().clone();
        let (crawl_state, last_outcome) = match self.inner.progress.read() {
            Ok(progress) => (progress.crawl_state.clone(), progress.last_outcome.clone()),
            Err(_) => (None, None),
        };

        RefreshStatus {
            running: run.is_some(),
            run_id: run.as_ref().map(|r| r.id),
            started_at: run.as_ref().map(|r| r.started_at),
            crawl_state: match (&run, crawl_state) {
                (Some(_), Some(state)) => state,
                _ => CrawlState::Idle,
            },
            last_outcome,
            refreshes_total: self.inner.refreshes_total.load(Ordering::SeqCst),
        }
    }
}

impl Inner {
    async fn run(guard: RunGuard) -> RefreshOutcome {
        let this = Arc::clone(&guard.inner);
        let run = guard.run.clone();
        let timer = Instant::now();

        info!(run_id = %run.id, entry_url = %this.crawler.entry_url(), "Refresh started");

        let outcome = match this.crawler.crawl(&run.cancel).await {
            Ok(report) => this.publish(&run, report).await,
            Err(failure) => Self::crawl_failed(&run, failure),
        };

        let elapsed = timer.elapsed().as_secs_f64();
        REFRESHES.with_label_values(&[outcome.label()]).inc();
        REFRESH_DURATION
            .with_label_values(&[outcome.label()])
            .observe(elapsed);
        this.refreshes_total.fetch_add(1, Ordering::SeqCst);

        match &outcome {
            RefreshOutcome::Published(summary) => info!(
                run_id = %run.id,
                generation = summary.generation.id,
                records = summary.generation.record_count,
                elapsed_secs = elapsed,
                "Refresh published"
            ),
            RefreshOutcome::Failed(failure) => warn!(
                run_id = %run.id,
                last_url = failure.last_url.as_deref().unwrap_or(""),
                elapsed_secs = elapsed,
                "Refresh failed: {}",
                failure.cause
            ),
        }

        if let Ok(mut progress) = this.progress.write() {
            progress.last_outcome = Some(outcome.clone());
        }

        drop(guard);
        outcome
    }

    /// Claim the single refresh slot.
    fn begin(this: &Arc<Self>) -> Result<RunGuard, RefreshError> {
        let mut active = this.active();

        if let Some(run) = active.as_ref() {
            REFRESHES.with_label_values(&["rejected"]).inc();
            warn!(run_id = %run.id, "Refresh rejected: already in progress");
            return Err(RefreshError::InProgress { run_id: run.id });
        }

        let run = ActiveRun {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            cancel: Arc::new(CancelSignal::new()),
        };
        *active = Some(run.clone());
        drop(active);

        if let Ok(mut progress) = this.progress.write() {
            progress.crawl_state = Some(CrawlState::Idle);
        }

        Ok(RunGuard {
            inner: Arc::clone(this),
            run,
        })
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn publish(&self, run: &ActiveRun, report: CrawlReport) -> RefreshOutcome {
        let CrawlReport {
            staged,
            pages_fetched,
            entries_seen,
            entries_skipped,
            normalization_failures,
            last_url,
        } = report;

        let (generation, duplicates) = staged.seal();
        DUPLICATES_DROPPED.inc_by(duplicates.len() as u64);

        let store = Arc::clone(&self.store);
        let to_publish = generation.clone();
        let published = tokio::task::spawn_blocking(move || store.publish(to_publish)).await;

        let info = match published {
            Ok(Ok(info)) => info,
            Ok(Err(e)) => {
                error!(run_id = %run.id, "Publish failed: {}", e);
                let cause = format!("publish failed: {}", e);
                return Self::failed(run, Some(last_url), cause, pages_fetched, false);
            }
            Err(e) => {
                error!(run_id = %run.id, "Publish task failed: {}", e);
                let cause = format!("publish task failed: {}", e);
                return Self::failed(run, Some(last_url), cause, pages_fetched, false);
            }
        };
        PUBLISHED_RECORDS.set(info.record_count as i64);

        let artifact_error = match &self.config.artifact_path {
            Some(path) => {
                let path = path.clone();
                let result =
                    tokio::task::spawn_blocking(move || write_artifact(&path, &generation)).await;
                match result {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => {
                        warn!(run_id = %run.id, "Failed to write snapshot artifact: {}", e);
                        Some(e.to_string())
                    }
                    Err(e) => {
                        warn!(run_id = %run.id, "Artifact task failed: {}", e);
                        Some(e.to_string())
                    }
                }
            }
            None => None,
        };

        RefreshOutcome::Published(RefreshSummary {
            run_id: run.id,
            generation: info,
            pages_fetched,
            entries_seen,
            entries_skipped,
            normalization_failures,
            duplicates,
            artifact_error,
            started_at: run.started_at,
            finished_at: Utc::now(),
        })
    }

    fn crawl_failed(run: &ActiveRun, failure: CrawlFailure) -> RefreshOutcome {
        Self::failed(
            run,
            failure.error.last_url().map(str::to_string),
            failure.error.to_string(),
            failure.pages_fetched,
            failure.error.is_cancelled(),
        )
    }

    fn failed(
        run: &ActiveRun,
        last_url: Option<String>,
        cause: String,
        pages_fetched: u32,
        cancelled: bool,
    ) -> RefreshOutcome {
        RefreshOutcome::Failed(RefreshFailure {
            run_id: run.id,
            last_url,
            cause,
            pages_fetched,
            cancelled,
            started_at: run.started_at,
            finished_at: Utc::now(),
        })
    }
}
