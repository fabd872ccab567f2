use crate::{AppState, Assignment, JobId};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodingView {
    pub rows: Vec<JobRowView>,
    pub candidates: Vec<CandidateRowView>,
    pub total_jobs: usize,
    pub coded_jobs: usize,
    pub hide_coded: bool,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub description: String,
    pub code: String,
    pub assignment: Assignment,
    pub selected: bool,
    /// Whether any suggestion, real or placeholder, has arrived for this job.
    pub has_results: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRowView {
    pub label: String,
    pub description: String,
    pub distance: f64,
    pub rank: u32,
    pub selected: bool,
}

impl AppState {
    pub fn view(&self) -> CodingView {
        let rows = self
            .visible_jobs()
            .into_iter()
            .map(|job| JobRowView {
                job_id: job.id.clone(),
                description: job.description.clone(),
                code: job.code.clone(),
                assignment: job.assignment(),
                selected: self.selected_job_id.as_ref() == Some(&job.id),
                has_results: self.suggestion_for(&job.id).is_some(),
            })
            .collect();
        let candidates = self
            .visible_candidates()
            .into_iter()
            .map(|candidate| CandidateRowView {
                selected: candidate == self.selected_result,
                label: candidate.label,
                description: candidate.description,
                distance: candidate.distance,
                rank: candidate.rank,
            })
            .collect();

        CodingView {
            rows,
            candidates,
            total_jobs: self.jobs.len(),
            coded_jobs: self.coded_count(),
            hide_coded: self.hide_coded,
            session_id: self.session_id.as_ref().map(ToString::to_string),
        }
    }
}
