use crate::{Candidate, Job, JobId, SessionId, Suggestion, SyncOrigin};

/// Every state transition the store understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Bulk ingestion of a new batch.
    LoadJobs(Vec<Job>),
    /// Operator picked a row in the primary list.
    SelectJob(JobId),
    /// Operator picked a candidate in the secondary list.
    SelectResult(Candidate),
    /// Replace all suggestions at once.
    UpdateResults(Vec<Suggestion>),
    /// Merge suggestions by job id.
    ///
    /// `origin` names the session and batch a background sync was started
    /// under; the merge is rejected once either has been replaced.
    UpdateOneResult {
        results: Vec<Suggestion>,
        origin: Option<SyncOrigin>,
    },
    /// Write a candidate onto a job's code fields.
    AssignResult { job_id: JobId, candidate: Candidate },
    /// Replace one job record, keeping its position.
    EditJobDescription(Job),
    /// Carries the filter value the operator saw; the stored value becomes its negation.
    ToggleCodedRows(bool),
    NewSession(SessionId),
    /// Resume a batch fetched from the session service.
    LoadSession {
        session_id: SessionId,
        jobs: Vec<Job>,
        results_data: Vec<Suggestion>,
    },
    /// Jobs rewritten by the autocoder.
    ApplyAutocode(Vec<Job>),
    ClearAll,
}

/// Payload-free discriminant used to register subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    LoadJobs,
    SelectJob,
    SelectResult,
    UpdateResults,
    UpdateOneResult,
    AssignResult,
    EditJobDescription,
    ToggleCodedRows,
    NewSession,
    LoadSession,
    ApplyAutocode,
    ClearAll,
}

impl Action {
    /// Starts a session with a freshly generated identifier.
    pub fn new_session() -> Self {
        Action::NewSession(SessionId::generate())
    }

    pub fn update_one_result(result: Suggestion) -> Self {
        Action::UpdateOneResult {
            results: vec![result],
            origin: None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::LoadJobs(_) => ActionKind::LoadJobs,
            Action::SelectJob(_) => ActionKind::SelectJob,
            Action::SelectResult(_) => ActionKind::SelectResult,
            Action::UpdateResults(_) => ActionKind::UpdateResults,
            Action::UpdateOneResult { .. } => ActionKind::UpdateOneResult,
            Action::AssignResult { .. } => ActionKind::AssignResult,
            Action::EditJobDescription(_) => ActionKind::EditJobDescription,
            Action::ToggleCodedRows(_) => ActionKind::ToggleCodedRows,
            Action::NewSession(_) => ActionKind::NewSession,
            Action::LoadSession { .. } => ActionKind::LoadSession,
            Action::ApplyAutocode(_) => ActionKind::ApplyAutocode,
            Action::ClearAll => ActionKind::ClearAll,
        }
    }
}
