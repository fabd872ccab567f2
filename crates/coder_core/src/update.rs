use std::collections::HashSet;

use thiserror::Error;

use crate::upsert::upsert;
use crate::{Action, AppState, Job, JobId, SessionId, Suggestion, SyncOrigin};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("job id {0} appears more than once in the batch")]
    DuplicateJobId(JobId),
    #[error("results from session {origin:?} arrived after the store moved to {current:?}")]
    StaleSession {
        origin: Option<SessionId>,
        current: Option<SessionId>,
    },
    #[error("results for batch {origin} arrived after batch {current} was loaded")]
    StaleBatch { origin: u64, current: u64 },
}

/// Pure transition: applies an action to state and returns the next state.
pub fn update(mut state: AppState, action: &Action) -> Result<AppState, TransitionError> {
    match action {
        Action::LoadJobs(jobs) => {
            ensure_unique_ids(jobs)?;
            state.jobs = jobs.clone();
            state.selected_job_id = None;
            state.load_epoch = state.load_epoch.wrapping_add(1);
        }
        Action::SelectJob(job_id) => {
            state.selected_job_id = Some(job_id.clone());
        }
        Action::SelectResult(candidate) => {
            state.selected_result = candidate.clone();
        }
        Action::UpdateResults(results) => {
            state.results_data = results.clone();
        }
        Action::UpdateOneResult { results, origin } => {
            if let Some(origin) = origin {
                ensure_current(&state, origin)?;
            }
            state.results_data = upsert(&state.results_data, results.iter().cloned(), suggestion_key);
        }
        Action::AssignResult { job_id, candidate } => {
            if let Some(job) = state.jobs.iter_mut().find(|job| &job.id == job_id) {
                job.assign(candidate);
            }
        }
        Action::EditJobDescription(job) => {
            state.jobs = upsert(&state.jobs, Some(job.clone()), job_key);
        }
        Action::ToggleCodedRows(current) => {
            state.hide_coded = !current;
        }
        Action::NewSession(session_id) => {
            state.session_id = Some(session_id.clone());
        }
        Action::LoadSession {
            session_id,
            jobs,
            results_data,
        } => {
            ensure_unique_ids(jobs)?;
            state.session_id = Some(session_id.clone());
            state.jobs = jobs.clone();
            state.results_data = results_data.clone();
            state.load_epoch = state.load_epoch.wrapping_add(1);
        }
        Action::ApplyAutocode(jobs) => {
            state.jobs = upsert(&state.jobs, jobs.iter().cloned(), job_key);
        }
        Action::ClearAll => {
            state = AppState {
                load_epoch: state.load_epoch.wrapping_add(1),
                ..AppState::default()
            };
        }
    }

    Ok(state)
}

fn ensure_current(state: &AppState, origin: &SyncOrigin) -> Result<(), TransitionError> {
    if origin.session_id != state.session_id {
        return Err(TransitionError::StaleSession {
            origin: origin.session_id.clone(),
            current: state.session_id.clone(),
        });
    }
    if origin.load_epoch != state.load_epoch {
        return Err(TransitionError::StaleBatch {
            origin: origin.load_epoch,
            current: state.load_epoch,
        });
    }
    Ok(())
}

fn job_key(job: &Job) -> Option<JobId> {
    if job.id.as_str().is_empty() {
        None
    } else {
        Some(job.id.clone())
    }
}

fn suggestion_key(suggestion: &Suggestion) -> Option<JobId> {
    if suggestion.input_id.as_str().is_empty() {
        None
    } else {
        Some(suggestion.input_id.clone())
    }
}

fn ensure_unique_ids(jobs: &[Job]) -> Result<(), TransitionError> {
    let mut seen = HashSet::with_capacity(jobs.len());
    for job in jobs {
        if !seen.insert(&job.id) {
            return Err(TransitionError::DuplicateJobId(job.id.clone()));
        }
    }
    Ok(())
}
