use coder_core::{
    autocode, autocode_report, AutocodeThresholds, Candidate, Job, JobId, Suggestion,
};

const THRESHOLDS: AutocodeThresholds = AutocodeThresholds {
    max_distance: 0.5,
    min_diff: 0.05,
};

fn suggestion(id: &str, candidates: &[(u32, f64, &str)]) -> Suggestion {
    Suggestion::new(
        JobId::from(id),
        candidates
            .iter()
            .map(|(rank, distance, label)| Candidate::new(*label, format!("{label} desc"), *distance, *rank))
            .collect(),
    )
}

#[test]
fn clear_top_candidate_is_assigned() {
    let jobs = vec![Job::new("1", "estate agent")];
    let suggestions = vec![suggestion("1", &[(1, 0.3, "A")])];

    let coded = autocode(&jobs, &suggestions, THRESHOLDS, true);
    assert_eq!(coded[0].code, "A");
    assert_eq!(coded[0].code_description, "A desc");
    assert_eq!(coded[0].code_score, Some(0.3));
    assert_eq!(coded[0].code_rank, Some(1));
}

#[test]
fn close_runner_up_blocks_assignment() {
    let jobs = vec![Job::new("1", "estate agent")];
    let suggestions = vec![suggestion("1", &[(1, 0.3, "A"), (2, 0.34, "B")])];

    let coded = autocode(&jobs, &suggestions, THRESHOLDS, true);
    assert_eq!(coded[0].code, "");
    assert_eq!(coded, jobs);
}

#[test]
fn distant_top_candidate_is_rejected_regardless_of_runner_up() {
    let jobs = vec![Job::new("1", "estate agent")];
    let suggestions = vec![suggestion("1", &[(1, 0.6, "A"), (2, 0.9, "B")])];

    let coded = autocode(&jobs, &suggestions, THRESHOLDS, true);
    assert!(!coded[0].is_coded());
}

#[test]
fn gap_equal_to_min_diff_is_assigned() {
    // 0.35 - 0.30 evaluates just below 0.05 in binary floating point.
    assert!(0.35_f64 - 0.30 < 0.05);
    let jobs = vec![Job::new("1", "estate agent"), Job::new("2", "roofer")];
    let suggestions = vec![
        suggestion("1", &[(1, 0.30, "A"), (2, 0.35, "B")]),
        suggestion("2", &[(1, 0.5, "C"), (2, 0.9, "D")]),
    ];

    let coded = autocode(&jobs, &suggestions, THRESHOLDS, true);
    assert_eq!(coded[0].code, "A");
    assert_eq!(coded[1].code, "C");
}

#[test]
fn wide_gap_to_runner_up_is_assigned() {
    let jobs = vec![Job::new("1", "estate agent")];
    let suggestions = vec![suggestion("1", &[(2, 0.45, "B"), (1, 0.2, "A")])];

    let coded = autocode(&jobs, &suggestions, THRESHOLDS, true);
    assert_eq!(coded[0].code, "A");
}

#[test]
fn already_coded_jobs_are_left_alone_when_ignoring_assigned() {
    let mut manual = Job::new("1", "estate agent");
    manual.assign(&Candidate::new("MANUAL", "chosen by hand", 0.9, 4));
    let suggestions = vec![suggestion("1", &[(1, 0.1, "A")])];

    let kept = autocode(std::slice::from_ref(&manual), &suggestions, THRESHOLDS, true);
    assert_eq!(kept[0].code, "MANUAL");

    let recoded = autocode(&[manual], &suggestions, THRESHOLDS, false);
    assert_eq!(recoded[0].code, "A");
}

#[test]
fn jobs_without_usable_suggestions_are_skipped() {
    let jobs = vec![Job::new("1", "a"), Job::new("2", "b"), Job::new("3", "c")];
    let suggestions = vec![
        suggestion("2", &[(2, 0.1, "ONLY-RANK-2")]),
        Suggestion::failure_placeholder(JobId::from("3"), 5),
    ];
    let generous = AutocodeThresholds {
        max_distance: 100.0,
        min_diff: 0.0,
    };

    let outcome = autocode_report(&jobs, &suggestions, generous, true);
    assert!(outcome.assigned.is_empty());
    assert_eq!(outcome.jobs, jobs);
}

#[test]
fn rerunning_is_stable() {
    let jobs = vec![Job::new("1", "a"), Job::new("2", "b")];
    let suggestions = vec![
        suggestion("1", &[(1, 0.1, "A")]),
        suggestion("2", &[(1, 0.2, "B"), (2, 0.21, "C")]),
    ];

    let first = autocode_report(&jobs, &suggestions, THRESHOLDS, true);
    assert_eq!(first.assigned, vec![JobId::from("1")]);
    let second = autocode_report(&first.jobs, &suggestions, THRESHOLDS, true);
    assert!(second.assigned.is_empty());
    assert_eq!(second.jobs, first.jobs);
}
