use std::collections::HashSet;

use coder_core::{Job, JobId, Suggestion, UNCODABLE_LABEL};
use coder_logging::coder_warn;
use reqwest::{Method, Url};
use serde::Deserialize;

use crate::transport::{encode, parse_url, JsonTransport};
use crate::{HttpSettings, RemoteError};

/// Remote service returning ranked candidates for a batch of jobs.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// One round trip for `jobs`. Any error counts as a failed attempt.
    async fn classify(&self, jobs: &[Job]) -> Result<Vec<Suggestion>, RemoteError>;
}

#[derive(Debug, Deserialize)]
struct ClassificationResponse {
    data: Vec<Suggestion>,
}

/// Classifier backed by an HTTP endpoint accepting a JSON array of jobs.
#[derive(Debug, Clone)]
pub struct ReqwestClassifier {
    endpoint: Url,
    transport: JsonTransport,
}

impl ReqwestClassifier {
    pub fn new(endpoint: &str, settings: &HttpSettings) -> Result<Self, RemoteError> {
        Ok(Self {
            endpoint: parse_url(endpoint)?,
            transport: JsonTransport::new(settings)?,
        })
    }
}

#[async_trait::async_trait]
impl Classifier for ReqwestClassifier {
    async fn classify(&self, jobs: &[Job]) -> Result<Vec<Suggestion>, RemoteError> {
        let body = encode(jobs)?;
        let response: ClassificationResponse = self
            .transport
            .send_json(Method::POST, self.endpoint.clone(), Some(body))
            .await?;
        Ok(response.data.into_iter().map(strip_reserved_labels).collect())
    }
}

/// The service may rank its own "*" rows; that label is reserved for operators.
fn strip_reserved_labels(mut suggestion: Suggestion) -> Suggestion {
    suggestion
        .response
        .retain(|candidate| candidate.label != UNCODABLE_LABEL);
    suggestion
}

/// Aligns a chunk's results with the jobs that were sent: results for jobs
/// outside the chunk are dropped and jobs the service skipped get a placeholder.
pub(crate) fn reconcile_chunk(chunk: &[Job], results: Vec<Suggestion>, attempts: u32) -> Vec<Suggestion> {
    let expected: HashSet<&JobId> = chunk.iter().map(|job| &job.id).collect();
    let mut reconciled: Vec<Suggestion> = results
        .into_iter()
        .filter(|suggestion| {
            let known = expected.contains(&suggestion.input_id);
            if !known {
                coder_warn!(
                    "Dropping result for job {} which was not in the chunk",
                    suggestion.input_id
                );
            }
            known
        })
        .collect();

    let answered: HashSet<JobId> = reconciled
        .iter()
        .map(|suggestion| suggestion.input_id.clone())
        .collect();
    for job in chunk {
        if !answered.contains(&job.id) {
            coder_warn!("Classifier returned nothing for job {}", job.id);
            reconciled.push(Suggestion::failure_placeholder(job.id.clone(), attempts));
        }
    }
    reconciled
}

#[cfg(test)]
mod tests {
    use coder_core::Candidate;

    use super::*;

    #[test]
    fn reconcile_fills_gaps_and_drops_strangers() {
        let chunk = vec![Job::new("1", "a"), Job::new("2", "b")];
        let results = vec![
            Suggestion::new(JobId::from("2"), vec![Candidate::new("X", "x", 0.1, 1)]),
            Suggestion::new(JobId::from("99"), Vec::new()),
        ];

        let reconciled = reconcile_chunk(&chunk, results, 1);
        let ids: Vec<_> = reconciled.iter().map(|s| s.input_id.to_string()).collect();
        assert_eq!(ids, vec!["2".to_string(), "1".to_string()]);
        assert!(!reconciled[0].failed);
        assert!(reconciled[1].failed);
    }

    #[test]
    fn reserved_label_is_removed_from_service_rankings() {
        let suggestion = Suggestion::new(
            JobId::from("1"),
            vec![
                Candidate::new("*", "uncodable", 0.05, 1),
                Candidate::new("1234", "worker", 0.5, 2),
            ],
        );
        let stripped = strip_reserved_labels(suggestion);
        assert_eq!(stripped.response.len(), 1);
        assert_eq!(stripped.response[0].label, "1234");
    }
}
