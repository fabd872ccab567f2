use std::sync::Once;

use coder_core::{Action, Candidate, Job, JobId, RemoteEffect, SessionId, Suggestion};
use coder_engine::{FailureKind, HttpSettings, ResultArchive, SessionClient};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(coder_logging::initialize_for_tests);
}

async fn client(server: &MockServer) -> SessionClient {
    SessionClient::new(&server.uri(), &HttpSettings::default()).unwrap()
}

#[tokio::test]
async fn post_session_sends_session_and_jobs_pair() {
    init_logging();
    let server = MockServer::start().await;
    let job = Job::new(12, "bus driver");
    Mock::given(method("POST"))
        .and(path("/post_session"))
        .and(body_json(json!(["s-1", [job]])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .await
        .post_session(&SessionId::new("s-1"), &[job.clone()])
        .await
        .unwrap();
}

#[tokio::test]
async fn assignment_push_names_job_and_candidate() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/update_job_code"))
        .and(body_json(json!([
            "s-1",
            {
                "jobId": "12",
                "result": {"label": "8331", "description": "Bus driver", "distance": 0.1, "rank": 1}
            }
        ])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let effect = RemoteEffect::PushAssignment {
        session_id: SessionId::new("s-1"),
        job_id: JobId::from("12"),
        candidate: Candidate::new("8331", "Bus driver", 0.1, 1),
    };
    client(&server).await.apply(&effect).await.unwrap();
}

#[tokio::test]
async fn bulk_job_update_and_result_archive_use_their_routes() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/update_many_jobs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/post_results"))
        .and(body_json(json!(["s-1", [{"input_id": "3", "response": []}]])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let session = SessionId::new("s-1");
    client
        .apply(&RemoteEffect::PushJobs {
            session_id: session.clone(),
            jobs: vec![Job::new(3, "nurse")],
        })
        .await
        .unwrap();
    client
        .post_results(&session, &[Suggestion::new(JobId::from("3"), Vec::new())])
        .await
        .unwrap();
}

#[tokio::test]
async fn previous_session_accepts_the_object_form() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_previous_session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessionID": "s-7",
            "jobs": [{
                "id": "5",
                "description": "welder",
                "code": "7212",
                "code_description": "Welder",
                "code_score": "0.31",
                "code_rank": "1"
            }],
            "resultsData": [{
                "input_id": 5,
                "response": [{"label": "7212", "description": "Welder", "distance": "0.31", "rank": "1"}]
            }]
        })))
        .mount(&server)
        .await;

    let snapshot = client(&server).await.previous_session().await.unwrap();

    assert_eq!(snapshot.session_id, SessionId::new("s-7"));
    assert_eq!(snapshot.jobs[0].code_score, Some(0.31));
    assert_eq!(snapshot.jobs[0].code_rank, Some(1));
    assert_eq!(snapshot.results_data[0].input_id, JobId::from("5"));
    assert!(matches!(snapshot.into_action(), Action::LoadSession { .. }));
}

#[tokio::test]
async fn previous_session_accepts_the_positional_form() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_previous_session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "s-8",
            [{"id": 1, "description": "baker", "code_score": "", "code_rank": ""}],
            []
        ])))
        .mount(&server)
        .await;

    let snapshot = client(&server).await.previous_session().await.unwrap();

    assert_eq!(snapshot.session_id, SessionId::new("s-8"));
    assert_eq!(snapshot.jobs[0].id, JobId::from("1"));
    assert_eq!(snapshot.jobs[0].code_score, None);
    assert!(snapshot.results_data.is_empty());
}

#[tokio::test]
async fn failed_push_surfaces_the_status() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .update_many_jobs(&SessionId::new("s-1"), &[])
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}
