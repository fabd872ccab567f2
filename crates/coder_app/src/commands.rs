use std::fmt::Write as _;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use coder_core::{
    attach_persistence, autocode_report, restore_state, Action, AppState, Assignment, Job,
    Key, KeyValueStore, Keymap, Navigator, Store, StoreHandle, Subscription,
};
use coder_engine::formats::{parse_jobs, render_jobs, FileFormat};
use coder_engine::{
    sync_into_store, AtomicFileWriter, ChunkedSync, FileStorage, ReqwestClassifier, SessionClient,
};
use coder_logging::{coder_info, coder_warn};

use crate::config::AppConfig;
use crate::effects::EffectRunner;

/// A store restored from durable storage, with persistence and optional
/// remote mirroring attached.
struct Workspace {
    store: StoreHandle,
    session: Option<SessionClient>,
    remote: Option<(EffectRunner, Subscription)>,
    _persist: Subscription,
}

impl Workspace {
    fn open(config: &AppConfig, mirror: bool) -> Result<Self> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStorage::new(&config.storage_dir));
        let mut store = Store::new(restore_state(storage.as_ref()));
        let persist = attach_persistence(&mut store, storage);

        let session = match &config.session_url {
            Some(url) => Some(
                SessionClient::new(url, &config.http_settings())
                    .with_context(|| format!("invalid session_url {url:?}"))?,
            ),
            None => None,
        };
        let remote = match (&session, mirror) {
            (Some(client), true) => {
                let runner = EffectRunner::spawn(client.clone());
                let subscription = runner.attach(&mut store);
                Some((runner, subscription))
            }
            _ => None,
        };

        Ok(Self {
            store: store.into_shared(),
            session,
            remote,
            _persist: persist,
        })
    }

    fn dispatch(&self, action: Action) -> Result<()> {
        self.store
            .dispatch(action)
            .context("state transition rejected")?;
        let session = self
            .store
            .with_state(|state| state.session_id.as_ref().map(ToString::to_string));
        coder_logging::set_session_tag(session.as_deref());
        Ok(())
    }

    async fn close(self) {
        if let Some((runner, subscription)) = self.remote {
            let failed = runner.finish(&self.store, subscription).await;
            if failed > 0 {
                coder_warn!("{} session service update(s) were not delivered", failed);
            }
        }
    }
}

fn chunked_sync(config: &AppConfig, workspace: &Workspace) -> Result<ChunkedSync> {
    let classifier = ReqwestClassifier::new(&config.classifier_url, &config.http_settings())
        .with_context(|| format!("invalid classifier_url {:?}", config.classifier_url))?;
    let mut sync = ChunkedSync::new(Arc::new(classifier), config.sync_settings());
    let session_id = workspace
        .store
        .with_state(|state| state.session_id.clone());
    // Results are archived through the effect queue so they never overtake
    // the post_session they depend on.
    if let (Some((runner, _)), Some(session_id)) = (&workspace.remote, session_id) {
        sync = sync.with_archive(runner.archive(), session_id);
    }
    Ok(sync)
}

pub struct CodeArgs {
    pub input: PathBuf,
    pub format: FileFormat,
    pub output: Option<PathBuf>,
    pub output_format: FileFormat,
    pub autocode: bool,
}

/// Starts a fresh session for `input`, classifies it and writes the coded batch.
pub async fn run_code(config: &AppConfig, args: CodeArgs) -> Result<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let jobs = parse_jobs(&text, args.format)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;
    coder_info!("Loaded {} jobs from {}", jobs.len(), args.input.display());

    let workspace = Workspace::open(config, true)?;
    workspace.dispatch(Action::ClearAll)?;
    workspace.dispatch(Action::new_session())?;
    workspace.dispatch(Action::LoadJobs(jobs.clone()))?;

    let sync = chunked_sync(config, &workspace)?;
    let report = sync_into_store(&workspace.store, &sync, &jobs).await;
    if report.degraded > 0 {
        coder_warn!(
            "{} of {} chunks could not be classified; their jobs carry ERROR suggestions",
            report.degraded,
            report.chunks
        );
    }

    if args.autocode {
        apply_autocode(config, &workspace)?;
    }

    let state = workspace.store.snapshot();
    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));
    let written = write_egress(&output, &state.jobs, args.output_format)?;
    println!("{}", summarize(&state));
    println!("Wrote {}", written.display());

    workspace.close().await;
    Ok(())
}

/// Replaces local state with the session service's last session and
/// re-classifies jobs that have no usable suggestions yet.
pub async fn run_resume(config: &AppConfig, autocode: bool) -> Result<()> {
    let workspace = Workspace::open(config, true)?;
    let Some(client) = workspace.session.clone() else {
        bail!("resume needs session_url in the configuration");
    };
    let snapshot = client
        .previous_session()
        .await
        .context("failed to fetch the previous session")?;
    coder_info!(
        "Resuming session {} with {} jobs",
        snapshot.session_id,
        snapshot.jobs.len()
    );
    workspace.dispatch(snapshot.into_action())?;

    let pending = workspace.store.with_state(pending_jobs);
    if !pending.is_empty() {
        coder_info!("Re-classifying {} jobs without suggestions", pending.len());
        let sync = chunked_sync(config, &workspace)?;
        sync_into_store(&workspace.store, &sync, &pending).await;
    }
    if autocode {
        apply_autocode(config, &workspace)?;
    }

    println!("{}", summarize(&workspace.store.snapshot()));
    workspace.close().await;
    Ok(())
}

pub fn run_status(config: &AppConfig, list: bool) -> Result<()> {
    let storage = FileStorage::new(&config.storage_dir);
    let state = restore_state(&storage);
    println!("{}", summarize(&state));
    if list {
        print!("{}", render_rows(&state));
    }
    Ok(())
}

pub async fn run_clear(config: &AppConfig) -> Result<()> {
    let workspace = Workspace::open(config, false)?;
    workspace.dispatch(Action::ClearAll)?;
    println!("Cleared stored state in {}", config.storage_dir.display());
    workspace.close().await;
    Ok(())
}

/// Drives the selection state machine from key names read line by line,
/// e.g. `down`, `right`, `enter`, `u`.
pub async fn run_review<R: BufRead>(config: &AppConfig, input: R) -> Result<()> {
    let workspace = Workspace::open(config, true)?;
    let keymap = Keymap::default();
    let mut navigator = Navigator::new();

    for line in input.lines() {
        let line = line.context("failed to read key input")?;
        for name in line.split_whitespace() {
            let key: Key = match name.parse() {
                Ok(key) => key,
                Err(err) => {
                    coder_warn!("{}", err);
                    continue;
                }
            };
            let Some(command) = keymap.resolve(key) else {
                coder_warn!("Key {:?} is not bound", key);
                continue;
            };
            let actions = workspace
                .store
                .with_state(|state| navigator.handle(state, command));
            for action in actions {
                workspace.dispatch(action)?;
            }
        }
    }

    let state = workspace.store.snapshot();
    println!("{}", summarize(&state));
    print!("{}", render_rows(&state));
    workspace.close().await;
    Ok(())
}

fn apply_autocode(config: &AppConfig, workspace: &Workspace) -> Result<()> {
    let outcome = workspace.store.with_state(|state| {
        autocode_report(&state.jobs, &state.results_data, config.autocode, true)
    });
    coder_info!("Autocoder assigned {} jobs", outcome.assigned.len());
    if !outcome.assigned.is_empty() {
        workspace.dispatch(Action::ApplyAutocode(outcome.jobs))?;
    }
    Ok(())
}

fn pending_jobs(state: &AppState) -> Vec<Job> {
    state
        .jobs
        .iter()
        .filter(|job| {
            state
                .suggestion_for(&job.id)
                .map_or(true, |suggestion| suggestion.failed)
        })
        .cloned()
        .collect()
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("jobs");
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    input.with_file_name(format!("{stem}_coded_{stamp}.txt"))
}

fn write_egress(output: &Path, jobs: &[Job], format: FileFormat) -> Result<PathBuf> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = output
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("invalid output path {}", output.display()))?;
    let content = render_jobs(jobs, format);
    AtomicFileWriter::new(dir)
        .write(filename, content.as_bytes())
        .with_context(|| format!("failed to write {}", output.display()))
}

fn summarize(state: &AppState) -> String {
    let view = state.view();
    let session = view.session_id.as_deref().unwrap_or("none");
    let failed = state
        .results_data
        .iter()
        .filter(|suggestion| suggestion.failed)
        .count();
    format!(
        "session {session}: {}/{} jobs coded, {} with suggestions ({} failed)",
        view.coded_jobs,
        view.total_jobs,
        state.results_data.len(),
        failed
    )
}

fn render_rows(state: &AppState) -> String {
    let view = state.view();
    let mut out = String::new();
    for row in &view.rows {
        let marker = if row.selected { '>' } else { ' ' };
        let code = match row.assignment {
            Assignment::Never => "-",
            Assignment::Cleared => "(cleared)",
            Assignment::Uncodable | Assignment::Coded => row.code.as_str(),
        };
        let _ = writeln!(out, "{marker} {:<8} {:<6} {}", row.job_id, code, row.description);
    }
    for candidate in &view.candidates {
        let marker = if candidate.selected { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "    {marker} {} {:.3} {}",
            candidate.label, candidate.distance, candidate.description
        );
    }
    out
}
