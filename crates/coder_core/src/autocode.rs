use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Job, JobId, Suggestion};

/// Slack for threshold comparisons; distances arrive as decimal fractions,
/// so a gap written as 0.05 may compute as 0.04999999999999999.
const THRESHOLD_TOLERANCE: f64 = 1e-9;

/// Acceptance thresholds for automatic assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutocodeThresholds {
    /// Largest top-candidate distance still accepted.
    pub max_distance: f64,
    /// Smallest gap required between the top two candidates.
    pub min_diff: f64,
}

impl Default for AutocodeThresholds {
    fn default() -> Self {
        Self {
            max_distance: 0.5,
            min_diff: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutocodeOutcome {
    pub jobs: Vec<Job>,
    /// Ids of the jobs that received a code in this pass.
    pub assigned: Vec<JobId>,
}

/// Assigns the rank-1 candidate to every job where it is close enough and
/// clearly ahead of rank 2. Pure; rerunning with `ignore_assigned` never
/// undoes an earlier assignment.
pub fn autocode(
    jobs: &[Job],
    suggestions: &[Suggestion],
    thresholds: AutocodeThresholds,
    ignore_assigned: bool,
) -> Vec<Job> {
    autocode_report(jobs, suggestions, thresholds, ignore_assigned).jobs
}

pub fn autocode_report(
    jobs: &[Job],
    suggestions: &[Suggestion],
    thresholds: AutocodeThresholds,
    ignore_assigned: bool,
) -> AutocodeOutcome {
    let by_id: HashMap<&JobId, &Suggestion> = suggestions
        .iter()
        .filter(|suggestion| !suggestion.failed)
        .map(|suggestion| (&suggestion.input_id, suggestion))
        .collect();

    let mut assigned = Vec::new();
    let jobs = jobs
        .iter()
        .map(|job| {
            if ignore_assigned && job.is_coded() {
                return job.clone();
            }
            let Some(suggestion) = by_id.get(&job.id) else {
                return job.clone();
            };
            let Some(top) = suggestion.candidate_with_rank(1) else {
                return job.clone();
            };
            if top.distance > thresholds.max_distance + THRESHOLD_TOLERANCE {
                return job.clone();
            }
            let clear_lead = match suggestion.candidate_with_rank(2) {
                None => true,
                Some(second) => {
                    second.distance - top.distance + THRESHOLD_TOLERANCE >= thresholds.min_diff
                }
            };
            if !clear_lead {
                return job.clone();
            }
            let mut coded = job.clone();
            coded.assign(top);
            assigned.push(job.id.clone());
            coded
        })
        .collect();

    AutocodeOutcome { jobs, assigned }
}
