//! Sequential, chunked classification with bounded retries.
//!
//! A batch is cut into fixed-size chunks that are sent one after another.
//! Each chunk gets a fixed number of attempts separated by a fixed backoff.
//! Whatever happens, every chunk is reported to the caller exactly once and
//! in submission order, either with the service's results or with failure
//! placeholders for all of its jobs.

use std::sync::Arc;
use std::time::Duration;

use coder_core::{Action, AppState, Job, SessionId, StoreHandle, Suggestion};
use coder_logging::{coder_debug, coder_info, coder_warn};

use crate::classify::reconcile_chunk;
use crate::{Classifier, RemoteError, ResultArchive};

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub chunk_size: usize,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            chunk_size: 20,
            max_attempts: 5,
            backoff: Duration::from_millis(2000),
        }
    }
}

/// One chunk's results as handed to the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDelivery {
    /// Zero-based position of the chunk in the batch.
    pub index: usize,
    pub results: Vec<Suggestion>,
    pub attempts: u32,
    /// Last error when every attempt failed and `results` are placeholders.
    pub degraded: Option<RemoteError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub chunks: usize,
    pub delivered: usize,
    pub degraded: usize,
    pub attempts: u32,
}

pub struct ChunkedSync {
    classifier: Arc<dyn Classifier>,
    archive: Option<(Arc<dyn ResultArchive>, SessionId)>,
    settings: SyncSettings,
}

impl ChunkedSync {
    pub fn new(classifier: Arc<dyn Classifier>, settings: SyncSettings) -> Self {
        Self {
            classifier,
            archive: None,
            settings,
        }
    }

    /// Forward every successfully classified chunk to `archive` under `session_id`.
    pub fn with_archive(mut self, archive: Arc<dyn ResultArchive>, session_id: SessionId) -> Self {
        self.archive = Some((archive, session_id));
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Classifies `jobs` chunk by chunk, calling `on_chunk` once per chunk.
    pub async fn run<F>(&self, jobs: &[Job], mut on_chunk: F) -> SyncReport
    where
        F: FnMut(ChunkDelivery),
    {
        let chunk_size = self.settings.chunk_size.max(1);
        let mut report = SyncReport::default();
        coder_info!(
            "Sync started jobs={} chunk_size={} max_attempts={}",
            jobs.len(),
            chunk_size,
            self.settings.max_attempts
        );

        for (index, chunk) in jobs.chunks(chunk_size).enumerate() {
            report.chunks += 1;
            let (delivery, to_archive) = match self.classify_with_retries(chunk).await {
                Ok((results, attempts)) => {
                    let results = reconcile_chunk(chunk, results, attempts);
                    let to_archive = self.archive.is_some().then(|| results.clone());
                    report.delivered += 1;
                    report.attempts += attempts;
                    let delivery = ChunkDelivery {
                        index,
                        results,
                        attempts,
                        degraded: None,
                    };
                    (delivery, to_archive)
                }
                Err((err, attempts)) => {
                    coder_warn!(
                        "Chunk {} gave up after {} attempts: {}; substituting placeholders",
                        index,
                        attempts,
                        err
                    );
                    report.degraded += 1;
                    report.attempts += attempts;
                    let delivery = ChunkDelivery {
                        index,
                        results: chunk
                            .iter()
                            .map(|job| Suggestion::failure_placeholder(job.id.clone(), attempts))
                            .collect(),
                        attempts,
                        degraded: Some(err),
                    };
                    (delivery, None)
                }
            };
            // The caller sees each chunk before it is archived.
            on_chunk(delivery);
            if let Some(results) = to_archive {
                self.archive_results(index, &results).await;
            }
        }

        coder_info!(
            "Sync finished chunks={} delivered={} degraded={} attempts={}",
            report.chunks,
            report.delivered,
            report.degraded,
            report.attempts
        );
        report
    }

    /// Refreshes a single job outside any batch, with the same retry policy.
    pub async fn fetch_one(&self, job: &Job) -> Suggestion {
        let chunk = std::slice::from_ref(job);
        match self.classify_with_retries(chunk).await {
            Ok((results, attempts)) => reconcile_chunk(chunk, results, attempts)
                .into_iter()
                .next()
                .unwrap_or_else(|| Suggestion::failure_placeholder(job.id.clone(), attempts)),
            Err((err, attempts)) => {
                coder_warn!("Refresh of job {} failed: {}", job.id, err);
                Suggestion::failure_placeholder(job.id.clone(), attempts)
            }
        }
    }

    async fn classify_with_retries(
        &self,
        chunk: &[Job],
    ) -> Result<(Vec<Suggestion>, u32), (RemoteError, u32)> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.classifier.classify(chunk).await {
                Ok(results) => return Ok((results, attempt)),
                Err(err) if attempt < max_attempts => {
                    coder_debug!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt,
                        max_attempts,
                        err,
                        self.settings.backoff
                    );
                    tokio::time::sleep(self.settings.backoff).await;
                }
                Err(err) => return Err((err, attempt)),
            }
        }
    }

    async fn archive_results(&self, index: usize, results: &[Suggestion]) {
        let Some((archive, session_id)) = &self.archive else {
            return;
        };
        if let Err(err) = archive.post_results(session_id, results).await {
            coder_warn!("Could not archive results of chunk {}: {}", index, err);
        }
    }
}

/// Runs `sync` over `jobs` and merges every chunk into `store`.
///
/// Merges are tagged with the session and batch current when the sync
/// started, so a sync that outlives either cannot write into its successor.
pub async fn sync_into_store(store: &StoreHandle, sync: &ChunkedSync, jobs: &[Job]) -> SyncReport {
    let origin = Some(store.with_state(AppState::sync_origin));
    sync.run(jobs, |delivery| {
        let action = Action::UpdateOneResult {
            results: delivery.results,
            origin: origin.clone(),
        };
        if store.dispatch(action).is_err() {
            coder_warn!("Chunk {} was not merged", delivery.index);
        }
    })
    .await
}

/// Refreshes one job's suggestions and merges them into `store`.
pub async fn refresh_one(store: &StoreHandle, sync: &ChunkedSync, job: &Job) -> Suggestion {
    let origin = Some(store.with_state(AppState::sync_origin));
    let suggestion = sync.fetch_one(job).await;
    let action = Action::UpdateOneResult {
        results: vec![suggestion.clone()],
        origin,
    };
    if store.dispatch(action).is_err() {
        coder_warn!("Refreshed result for job {} was not merged", job.id);
    }
    suggestion
}
