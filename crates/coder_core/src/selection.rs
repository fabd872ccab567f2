use crate::{Action, AppState, Candidate, Job, JobId};

/// Which list receives directional navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Jobs,
    Candidates,
}

/// Operator intents, independent of how they were entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    Next,
    Previous,
    FocusJobs,
    FocusCandidates,
    SwitchFocus,
    Confirm,
    MarkUncodable,
    Clear,
    ToggleHideCoded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    NoSelection,
    JobSelected,
    JobAndCandidateSelected,
}

pub fn selection_phase(state: &AppState) -> SelectionPhase {
    match state.selected_job() {
        None => SelectionPhase::NoSelection,
        Some(_) if state.selected_result.is_blank() => SelectionPhase::JobSelected,
        Some(_) => SelectionPhase::JobAndCandidateSelected,
    }
}

/// Actions for picking a job row: select it, then pre-select its closest candidate.
///
/// A failed classification offers nothing to pre-select.
pub fn select_job(state: &AppState, job_id: &JobId) -> Vec<Action> {
    let closest = state
        .suggestion_for(job_id)
        .filter(|suggestion| !suggestion.failed)
        .and_then(|suggestion| suggestion.by_distance().into_iter().next())
        .unwrap_or_default();
    vec![
        Action::SelectJob(job_id.clone()),
        Action::SelectResult(closest),
    ]
}

/// Keyboard-driven navigation across the job list and the candidate list.
///
/// Only focus lives here; everything else is read from the state passed in,
/// and changes come back as actions for the caller to dispatch in order.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    focus: Focus,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn handle(&mut self, state: &AppState, command: NavCommand) -> Vec<Action> {
        match command {
            NavCommand::Next => self.step(state, Direction::Forward),
            NavCommand::Previous => self.step(state, Direction::Backward),
            NavCommand::FocusJobs => {
                self.focus = Focus::Jobs;
                Vec::new()
            }
            NavCommand::FocusCandidates => {
                self.focus = Focus::Candidates;
                Vec::new()
            }
            NavCommand::SwitchFocus => {
                self.focus = match self.focus {
                    Focus::Jobs => Focus::Candidates,
                    Focus::Candidates => Focus::Jobs,
                };
                Vec::new()
            }
            NavCommand::Confirm => {
                if state.selected_result.is_blank() || selected_failed(state) {
                    return Vec::new();
                }
                self.commit(state, state.selected_result.clone())
            }
            NavCommand::MarkUncodable => self.commit(state, Candidate::uncodable()),
            NavCommand::Clear => match state.selected_job() {
                Some(job) => vec![Action::AssignResult {
                    job_id: job.id.clone(),
                    candidate: Candidate::blank(),
                }],
                None => Vec::new(),
            },
            NavCommand::ToggleHideCoded => vec![Action::ToggleCodedRows(state.hide_coded)],
        }
    }

    fn step(&self, state: &AppState, direction: Direction) -> Vec<Action> {
        match self.focus {
            Focus::Jobs => {
                let rows = state.visible_jobs();
                match job_row_after_step(state, &rows, direction) {
                    Some(index) => select_job(state, &rows[index].id),
                    None => Vec::new(),
                }
            }
            Focus::Candidates => {
                if state.selected_job().is_none() || selected_failed(state) {
                    return Vec::new();
                }
                let candidates = state.visible_candidates();
                let current = candidates
                    .iter()
                    .position(|candidate| candidate == &state.selected_result);
                match move_index(current, candidates.len(), direction) {
                    Some(index) => vec![Action::SelectResult(candidates[index].clone())],
                    None => Vec::new(),
                }
            }
        }
    }

    /// Assigns `candidate` to the selected job and moves on to the next visible row.
    fn commit(&self, state: &AppState, candidate: Candidate) -> Vec<Action> {
        let Some(job) = state.selected_job() else {
            return Vec::new();
        };
        let mut actions = vec![Action::AssignResult {
            job_id: job.id.clone(),
            candidate,
        }];

        let rows = state.visible_jobs();
        let next = rows
            .iter()
            .position(|row| row.id == job.id)
            .and_then(|index| rows.get(index + 1));
        if let Some(next) = next {
            actions.extend(select_job(state, &next.id));
        }
        actions
    }
}

/// True when the selected job's classification gave up; its placeholder
/// candidate is for display only.
fn selected_failed(state: &AppState) -> bool {
    state
        .selected_job_id
        .as_ref()
        .and_then(|id| state.suggestion_for(id))
        .is_some_and(|suggestion| suggestion.failed)
}

/// Target row in `rows` for a job-list step.
///
/// A selection hidden by the coded filter still anchors the step: moving
/// lands on the nearest visible row in that direction, or nowhere.
fn job_row_after_step(state: &AppState, rows: &[&Job], direction: Direction) -> Option<usize> {
    let Some(selected) = state.selected_job_id.as_ref() else {
        return move_index(None, rows.len(), direction);
    };
    if let Some(index) = rows.iter().position(|job| &job.id == selected) {
        return move_index(Some(index), rows.len(), direction);
    }
    let Some(anchor) = state.jobs.iter().position(|job| &job.id == selected) else {
        return move_index(None, rows.len(), direction);
    };
    let order = |row: &&Job| state.jobs.iter().position(|job| job.id == row.id);
    match direction {
        Direction::Forward => rows.iter().position(|row| order(row) > Some(anchor)),
        Direction::Backward => rows.iter().rposition(|row| order(row) < Some(anchor)),
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// New index after one step, or `None` when the step would leave the list.
fn move_index(current: Option<usize>, len: usize, direction: Direction) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match (current, direction) {
        (None, _) => Some(0),
        (Some(index), Direction::Forward) if index + 1 < len => Some(index + 1),
        (Some(index), Direction::Backward) if index > 0 => Some(index - 1),
        _ => None,
    }
}
