use crate::{Action, AppState, Candidate, Job, JobId, SessionId, StorageKey, Suggestion};

/// Side effects owed after a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write one state slice to durable storage.
    Persist(StorageKey),
    ClearStorage,
    Remote(RemoteEffect),
}

/// Pushes mirrored to the session service.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEffect {
    PostSession {
        session_id: SessionId,
        jobs: Vec<Job>,
    },
    PushAssignment {
        session_id: SessionId,
        job_id: JobId,
        candidate: Candidate,
    },
    PushJobs {
        session_id: SessionId,
        jobs: Vec<Job>,
    },
    /// Archive a classified chunk. Queued by the sync rather than derived
    /// from a dispatch, so it never appears in `effects_for`.
    PostResults {
        session_id: SessionId,
        results: Vec<Suggestion>,
    },
}

/// Effects for `action`, given the state it produced.
pub fn effects_for(action: &Action, state: &AppState) -> Vec<Effect> {
    let session = state.session_id.clone();
    match action {
        Action::LoadJobs(jobs) => {
            let mut effects = vec![
                Effect::Persist(StorageKey::Jobs),
                Effect::Persist(StorageKey::SelectedJobId),
            ];
            if let Some(session_id) = session {
                effects.push(Effect::Remote(RemoteEffect::PostSession {
                    session_id,
                    jobs: jobs.clone(),
                }));
            }
            effects
        }
        Action::SelectJob(_) => vec![Effect::Persist(StorageKey::SelectedJobId)],
        Action::SelectResult(_) => vec![Effect::Persist(StorageKey::SelectedResult)],
        Action::UpdateResults(_) | Action::UpdateOneResult { .. } => {
            vec![Effect::Persist(StorageKey::ResultsData)]
        }
        Action::AssignResult { job_id, candidate } => {
            let mut effects = vec![Effect::Persist(StorageKey::Jobs)];
            if let (Some(session_id), Some(_)) = (session, state.job(job_id)) {
                effects.push(Effect::Remote(RemoteEffect::PushAssignment {
                    session_id,
                    job_id: job_id.clone(),
                    candidate: candidate.clone(),
                }));
            }
            effects
        }
        Action::EditJobDescription(job) => {
            push_jobs(session, std::slice::from_ref(job))
        }
        Action::ApplyAutocode(jobs) => push_jobs(session, jobs),
        Action::ToggleCodedRows(_) => vec![Effect::Persist(StorageKey::HideCoded)],
        Action::NewSession(_) => vec![Effect::Persist(StorageKey::SessionId)],
        Action::LoadSession { .. } => vec![
            Effect::Persist(StorageKey::SessionId),
            Effect::Persist(StorageKey::Jobs),
            Effect::Persist(StorageKey::ResultsData),
        ],
        Action::ClearAll => vec![Effect::ClearStorage],
    }
}

fn push_jobs(session: Option<SessionId>, jobs: &[Job]) -> Vec<Effect> {
    let mut effects = vec![Effect::Persist(StorageKey::Jobs)];
    if let Some(session_id) = session {
        if !jobs.is_empty() {
            effects.push(Effect::Remote(RemoteEffect::PushJobs {
                session_id,
                jobs: jobs.to_vec(),
            }));
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_to_missing_job_is_not_pushed() {
        let mut state = AppState::new();
        state.session_id = Some(SessionId::new("s-1"));
        let action = Action::AssignResult {
            job_id: JobId::from("404"),
            candidate: Candidate::uncodable(),
        };
        assert_eq!(
            effects_for(&action, &state),
            vec![Effect::Persist(StorageKey::Jobs)]
        );
    }

    #[test]
    fn load_jobs_without_session_stays_local() {
        let state = AppState::new();
        let effects = effects_for(&Action::LoadJobs(vec![Job::new("1", "nurse")]), &state);
        assert!(effects
            .iter()
            .all(|effect| matches!(effect, Effect::Persist(_))));
    }
}
