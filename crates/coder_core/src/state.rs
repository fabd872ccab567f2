use serde::{Deserialize, Serialize};

use crate::{Candidate, Job, JobId, SessionId, Suggestion};

/// The single application state value held by the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppState {
    pub jobs: Vec<Job>,
    pub results_data: Vec<Suggestion>,
    pub selected_job_id: Option<JobId>,
    pub selected_result: Candidate,
    pub hide_coded: bool,
    pub session_id: Option<SessionId>,
    /// Advanced by every batch replacement; background merges carry the
    /// value they started under.
    #[serde(default)]
    pub load_epoch: u64,
}

/// Where a background merge was started: the session and the loaded batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOrigin {
    pub session_id: Option<SessionId>,
    pub load_epoch: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub fn suggestion_for(&self, id: &JobId) -> Option<&Suggestion> {
        self.results_data
            .iter()
            .find(|suggestion| &suggestion.input_id == id)
    }

    /// The selected job, or `None` when nothing (or a stale id) is selected.
    pub fn selected_job(&self) -> Option<&Job> {
        self.selected_job_id.as_ref().and_then(|id| self.job(id))
    }

    /// Jobs shown in the primary list, honouring the hide-coded filter.
    pub fn visible_jobs(&self) -> Vec<&Job> {
        self.jobs
            .iter()
            .filter(|job| !(self.hide_coded && job.is_coded()))
            .collect()
    }

    /// Candidates for the selected job, closest first.
    pub fn visible_candidates(&self) -> Vec<Candidate> {
        self.selected_job_id
            .as_ref()
            .and_then(|id| self.suggestion_for(id))
            .map(Suggestion::by_distance)
            .unwrap_or_default()
    }

    /// Tag for merges that may complete after this state has moved on.
    pub fn sync_origin(&self) -> SyncOrigin {
        SyncOrigin {
            session_id: self.session_id.clone(),
            load_epoch: self.load_epoch,
        }
    }

    pub fn coded_count(&self) -> usize {
        self.jobs.iter().filter(|job| job.is_coded()).count()
    }
}
