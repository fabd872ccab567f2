use std::sync::Arc;

use coder_core::{
    effects_for, Effect, RemoteEffect, SessionId, Store, StoreHandle, Subscription, Suggestion,
};
use coder_engine::{FailureKind, RemoteError, ResultArchive, SessionClient};
use coder_logging::{coder_debug, coder_info, coder_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum Queued {
    Apply(RemoteEffect),
    Stop,
}

/// Forwards the remote effects of every dispatch to the session service.
///
/// Dispatch stays synchronous: the subscriber only queues effects and a
/// background task sends them in order. Archived sync results join the same
/// queue, so they always follow the session they belong to.
pub struct EffectRunner {
    tx: mpsc::UnboundedSender<Queued>,
    worker: JoinHandle<usize>,
}

impl EffectRunner {
    pub fn spawn(client: SessionClient) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Queued>();
        let worker = tokio::spawn(async move {
            let mut failed = 0;
            while let Some(Queued::Apply(effect)) = rx.recv().await {
                match client.apply(&effect).await {
                    Ok(()) => coder_debug!("Remote effect delivered: {}", describe(&effect)),
                    Err(err) => {
                        failed += 1;
                        coder_warn!("Remote effect {} failed: {}", describe(&effect), err);
                    }
                }
            }
            failed
        });
        Self { tx, worker }
    }

    pub fn attach(&self, store: &mut Store) -> Subscription {
        let tx = self.tx.clone();
        store.subscribe_all(move |state, action| {
            for effect in effects_for(action, state) {
                if let Effect::Remote(remote) = effect {
                    if tx.send(Queued::Apply(remote)).is_err() {
                        coder_warn!("Remote effect worker is gone; dropping effect");
                    }
                }
            }
        })
    }

    /// An archive that queues results behind every effect dispatched so far.
    pub fn archive(&self) -> Arc<dyn ResultArchive> {
        Arc::new(QueuedArchive {
            tx: self.tx.clone(),
        })
    }

    /// Detaches from `store`, drains the queue and returns how many effects failed.
    ///
    /// Anything queued after this call, e.g. by an archive still held
    /// elsewhere, is dropped.
    pub async fn finish(self, store: &StoreHandle, subscription: Subscription) -> usize {
        store.lock().unsubscribe(subscription);
        if self.tx.send(Queued::Stop).is_err() {
            coder_warn!("Remote effect worker stopped early");
        }
        match self.worker.await {
            Ok(failed) => {
                coder_info!("Remote effects drained, {} failed", failed);
                failed
            }
            Err(err) => {
                coder_warn!("Remote effect worker ended abnormally: {}", err);
                0
            }
        }
    }
}

/// Hands results to the effect queue; delivery errors are counted by the
/// worker, not reported to the sync.
struct QueuedArchive {
    tx: mpsc::UnboundedSender<Queued>,
}

#[async_trait::async_trait]
impl ResultArchive for QueuedArchive {
    async fn post_results(
        &self,
        session_id: &SessionId,
        results: &[Suggestion],
    ) -> Result<(), RemoteError> {
        let effect = RemoteEffect::PostResults {
            session_id: session_id.clone(),
            results: results.to_vec(),
        };
        self.tx
            .send(Queued::Apply(effect))
            .map_err(|_| RemoteError {
                kind: FailureKind::Network,
                message: "remote effect queue is closed".to_string(),
            })
    }
}

fn describe(effect: &RemoteEffect) -> String {
    match effect {
        RemoteEffect::PostSession { session_id, jobs } => {
            format!("post_session({session_id}, {} jobs)", jobs.len())
        }
        RemoteEffect::PushAssignment {
            session_id, job_id, ..
        } => format!("update_job_code({session_id}, {job_id})"),
        RemoteEffect::PushJobs { session_id, jobs } => {
            format!("update_many_jobs({session_id}, {} jobs)", jobs.len())
        }
        RemoteEffect::PostResults {
            session_id,
            results,
        } => format!("post_results({session_id}, {} results)", results.len()),
    }
}
