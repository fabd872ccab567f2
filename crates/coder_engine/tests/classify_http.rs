use std::sync::{Arc, Once};
use std::time::Duration;

use coder_core::{Job, JobId};
use coder_engine::{
    ChunkedSync, Classifier, FailureKind, HttpSettings, ReqwestClassifier, SyncSettings,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(coder_logging::initialize_for_tests);
}

/// Replies with one candidate per posted job, like the real service.
struct EchoClassifier;

impl Respond for EchoClassifier {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let jobs: Vec<Value> = serde_json::from_slice(&request.body).unwrap_or_default();
        let data: Vec<Value> = jobs
            .iter()
            .map(|job| {
                json!({
                    "input_id": job["id"],
                    "response": [
                        {"label": "*", "description": "uncodable", "distance": 0.01, "rank": 1},
                        {"label": "2512", "description": "cook", "distance": "0.2", "rank": "2"}
                    ]
                })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }
}

fn fast_sync(classifier: ReqwestClassifier, chunk_size: usize) -> ChunkedSync {
    ChunkedSync::new(
        Arc::new(classifier),
        SyncSettings {
            chunk_size,
            max_attempts: 5,
            backoff: Duration::from_millis(1),
        },
    )
}

fn classifier_for(server: &MockServer) -> ReqwestClassifier {
    ReqwestClassifier::new(&format!("{}/classify", server.uri()), &HttpSettings::default())
        .unwrap()
}

#[tokio::test]
async fn parses_service_reply_and_strips_reserved_rows() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(EchoClassifier)
        .expect(1)
        .mount(&server)
        .await;

    let results = classifier_for(&server)
        .classify(&[Job::new(7, "line cook")])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].input_id, JobId::from("7"));
    assert_eq!(results[0].response.len(), 1);
    assert_eq!(results[0].response[0].label, "2512");
    assert_eq!(results[0].response[0].rank, 2);
}

#[tokio::test]
async fn error_status_is_reported_with_its_code() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = classifier_for(&server)
        .classify(&[Job::new(1, "x")])
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn reply_without_data_is_malformed() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let err = classifier_for(&server)
        .classify(&[Job::new(1, "x")])
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn oversized_reply_is_rejected() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
        .mount(&server)
        .await;

    let settings = HttpSettings {
        max_bytes: 1024,
        ..HttpSettings::default()
    };
    let classifier =
        ReqwestClassifier::new(&format!("{}/classify", server.uri()), &settings).unwrap();
    let err = classifier.classify(&[Job::new(1, "x")]).await.unwrap_err();

    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 1024, .. }));
}

#[test]
fn invalid_endpoint_is_rejected_up_front() {
    let err = ReqwestClassifier::new("not a url", &HttpSettings::default()).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn transient_server_errors_are_retried_over_http() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(EchoClassifier)
        .with_priority(2)
        .mount(&server)
        .await;

    let jobs: Vec<Job> = (1..=3).map(|id| Job::new(id, "porter")).collect();
    let mut deliveries = Vec::new();
    let report = fast_sync(classifier_for(&server), 2)
        .run(&jobs, |delivery| deliveries.push(delivery))
        .await;

    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].attempts, 4);
    assert_eq!(deliveries[1].attempts, 1);
    assert!(deliveries.iter().all(|d| d.degraded.is_none()));
    assert_eq!(report.degraded, 0);
}

#[tokio::test]
async fn unreachable_service_degrades_every_chunk() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let jobs: Vec<Job> = (1..=3).map(|id| Job::new(id, "porter")).collect();
    let mut deliveries = Vec::new();
    let report = fast_sync(classifier_for(&server), 2)
        .run(&jobs, |delivery| deliveries.push(delivery))
        .await;

    assert_eq!(report.degraded, 2);
    assert_eq!(report.attempts, 10);
    let placeholders: Vec<bool> = deliveries
        .iter()
        .flat_map(|d| d.results.iter().map(|s| s.failed))
        .collect();
    assert_eq!(placeholders, vec![true, true, true]);
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(10));
}
