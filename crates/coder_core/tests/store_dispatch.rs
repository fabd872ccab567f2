use std::sync::{Arc, Mutex, Once};

use coder_core::{Action, ActionKind, AppState, Job, JobId, Store};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(coder_logging::initialize_for_tests);
}

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(log: &Log, name: &'static str) -> impl FnMut(&AppState, &Action) + Send + 'static {
    let log = log.clone();
    move |state: &AppState, action: &Action| {
        log.lock()
            .unwrap()
            .push(format!("{name}:{:?}:{}", action.kind(), state.jobs.len()));
    }
}

#[test]
fn typed_listeners_run_before_wildcards_in_registration_order() {
    init_logging();
    let log: Log = Arc::default();
    let mut store = Store::default();
    let _ = store.subscribe_all(recorder(&log, "all"));
    let _ = store.subscribe(ActionKind::LoadJobs, recorder(&log, "first"));
    let _ = store.subscribe(ActionKind::LoadJobs, recorder(&log, "second"));
    let _ = store.subscribe(ActionKind::SelectJob, recorder(&log, "select"));

    store
        .dispatch(Action::LoadJobs(vec![Job::new("1", "chef")]))
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "first:LoadJobs:1".to_string(),
            "second:LoadJobs:1".to_string(),
            "all:LoadJobs:1".to_string(),
        ]
    );
}

#[test]
fn rejected_transition_keeps_state_and_skips_listeners() {
    init_logging();
    let log: Log = Arc::default();
    let mut store = Store::default();
    store
        .dispatch(Action::LoadJobs(vec![Job::new("1", "chef")]))
        .unwrap();
    let _ = store.subscribe_all(recorder(&log, "all"));
    let before = store.state().clone();

    let duplicate = vec![Job::new("2", "nurse"), Job::new("2", "nurse")];
    assert!(store.dispatch(Action::LoadJobs(duplicate)).is_err());

    assert_eq!(store.state(), &before);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn unsubscribe_removes_only_that_listener() {
    init_logging();
    let log: Log = Arc::default();
    let mut store = Store::default();
    let first = store.subscribe(ActionKind::SelectJob, recorder(&log, "first"));
    let _ = store.subscribe(ActionKind::SelectJob, recorder(&log, "second"));

    assert!(store.unsubscribe(first));
    assert!(!store.unsubscribe(first));
    store.dispatch(Action::SelectJob(JobId::from("1"))).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["second:SelectJob:0".to_string()]
    );
}

#[test]
fn shared_handle_serialises_dispatches() {
    init_logging();
    let handle = Store::default().into_shared();
    let jobs: Vec<Job> = (1..=50).map(|id| Job::new(JobId::from(id as u64), "worker")).collect();
    handle.dispatch(Action::LoadJobs(jobs)).unwrap();

    let threads: Vec<_> = (1..=50u64)
        .map(|id| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                let mut job = handle.with_state(|state| state.job(&JobId::from(id)).cloned().unwrap());
                job.description = format!("worker {id}");
                handle.dispatch(Action::EditJobDescription(job)).unwrap();
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    let state = handle.snapshot();
    assert_eq!(state.jobs.len(), 50);
    for (index, job) in state.jobs.iter().enumerate() {
        assert_eq!(job.id, JobId::from(index as u64 + 1));
        assert_eq!(job.description, format!("worker {}", index + 1));
    }
}
