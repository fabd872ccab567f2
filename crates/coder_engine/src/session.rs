use coder_core::{Action, Candidate, Job, JobId, RemoteEffect, SessionId, Suggestion};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::json;

use crate::transport::{encode, parse_url, JsonTransport};
use crate::{HttpSettings, RemoteError};

/// Destination for each chunk's results once they arrive.
#[async_trait::async_trait]
pub trait ResultArchive: Send + Sync {
    async fn post_results(
        &self,
        session_id: &SessionId,
        results: &[Suggestion],
    ) -> Result<(), RemoteError>;
}

/// Batch state returned by the session service for resuming work.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub jobs: Vec<Job>,
    pub results_data: Vec<Suggestion>,
}

impl SessionSnapshot {
    pub fn into_action(self) -> Action {
        Action::LoadSession {
            session_id: self.session_id,
            jobs: self.jobs,
            results_data: self.results_data,
        }
    }
}

/// Older service builds answer with a positional array instead of an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotWire {
    Object {
        #[serde(rename = "sessionID")]
        session_id: SessionId,
        jobs: Vec<Job>,
        #[serde(rename = "resultsData")]
        results_data: Vec<Suggestion>,
    },
    Positional(SessionId, Vec<Job>, Vec<Suggestion>),
}

impl From<SnapshotWire> for SessionSnapshot {
    fn from(wire: SnapshotWire) -> Self {
        match wire {
            SnapshotWire::Object {
                session_id,
                jobs,
                results_data,
            }
            | SnapshotWire::Positional(session_id, jobs, results_data) => Self {
                session_id,
                jobs,
                results_data,
            },
        }
    }
}

/// Client for the session-scoped persistence endpoints.
#[derive(Debug, Clone)]
pub struct SessionClient {
    base: Url,
    transport: JsonTransport,
}

impl SessionClient {
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self, RemoteError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            base: parse_url(&base)?,
            transport: JsonTransport::new(settings)?,
        })
    }

    pub async fn post_session(&self, session_id: &SessionId, jobs: &[Job]) -> Result<(), RemoteError> {
        self.send(Method::POST, "post_session", encode(&(session_id, jobs))?)
            .await
    }

    pub async fn update_job_code(
        &self,
        session_id: &SessionId,
        job_id: &JobId,
        candidate: &Candidate,
    ) -> Result<(), RemoteError> {
        let payload = json!([session_id, { "jobId": job_id, "result": candidate }]);
        self.send(Method::PUT, "update_job_code", encode(&payload)?)
            .await
    }

    pub async fn update_many_jobs(&self, session_id: &SessionId, jobs: &[Job]) -> Result<(), RemoteError> {
        self.send(Method::PUT, "update_many_jobs", encode(&(session_id, jobs))?)
            .await
    }

    pub async fn previous_session(&self) -> Result<SessionSnapshot, RemoteError> {
        let wire: SnapshotWire = self
            .transport
            .send_json(Method::GET, self.route("get_previous_session")?, None)
            .await?;
        Ok(wire.into())
    }

    /// Performs one queued remote effect.
    pub async fn apply(&self, effect: &RemoteEffect) -> Result<(), RemoteError> {
        match effect {
            RemoteEffect::PostSession { session_id, jobs } => self.post_session(session_id, jobs).await,
            RemoteEffect::PushAssignment {
                session_id,
                job_id,
                candidate,
            } => self.update_job_code(session_id, job_id, candidate).await,
            RemoteEffect::PushJobs { session_id, jobs } => {
                self.update_many_jobs(session_id, jobs).await
            }
            RemoteEffect::PostResults {
                session_id,
                results,
            } => self.post_results(session_id, results).await,
        }
    }

    async fn send(&self, method: Method, route: &str, body: String) -> Result<(), RemoteError> {
        self.transport
            .send(method, self.route(route)?, Some(body))
            .await
            .map(|_| ())
    }

    fn route(&self, route: &str) -> Result<Url, RemoteError> {
        self.base
            .join(route)
            .map_err(|err| RemoteError::new(crate::FailureKind::InvalidUrl, err.to_string()))
    }
}

#[async_trait::async_trait]
impl ResultArchive for SessionClient {
    async fn post_results(
        &self,
        session_id: &SessionId,
        results: &[Suggestion],
    ) -> Result<(), RemoteError> {
        self.send(Method::POST, "post_results", encode(&(session_id, results))?)
            .await
    }
}
