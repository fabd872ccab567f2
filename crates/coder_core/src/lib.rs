//! Coder core: state, pure transitions, autocoding and keyboard selection.
mod action;
mod autocode;
mod effect;
mod keymap;
mod persistence;
mod selection;
mod state;
mod store;
mod types;
mod update;
mod upsert;
mod view_model;

pub use action::{Action, ActionKind};
pub use autocode::{autocode, autocode_report, AutocodeOutcome, AutocodeThresholds};
pub use effect::{effects_for, Effect, RemoteEffect};
pub use keymap::{Key, Keymap};
pub use persistence::{
    attach_persistence, restore_state, write_slice, KeyValueStore, MemoryStorage, StorageError,
    StorageKey,
};
pub use selection::{select_job, selection_phase, Focus, NavCommand, Navigator, SelectionPhase};
pub use state::{AppState, SyncOrigin};
pub use store::{Store, StoreHandle, Subscription};
pub use types::{
    Assignment, Candidate, Job, JobId, SessionId, Suggestion, FAILED_LABEL, UNCODABLE_DESCRIPTION,
    UNCODABLE_DISTANCE, UNCODABLE_LABEL, UNCODABLE_RANK,
};
pub use update::{update, TransitionError};
pub use upsert::upsert;
pub use view_model::{CandidateRowView, CodingView, JobRowView};
