//! Testing utilities for the Remedy workspace
//!
//! Shared fixtures: temp workspaces, event recorders, scripted plugins and
//! patch appliers.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use async_trait::async_trait;
use parking_lot::Mutex;
use remedy_config::Settings;
use remedy_core::{AppliedPatch, PatchApplier, ReplaceContentApplier};
use remedy_events::{Event, EventBus, EventKind, Subscription};
use remedy_model::task::keys;
use remedy_model::{ErrorInfo, FixComplexity, ProblemClass, Task, TaskResult, TaskSubmission};
use remedy_plugin::Plugin;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A throwaway repository root
#[derive(Debug)]
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.file(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.file(name)).unwrap()
    }

    /// Physical `<name>.backup.*` copies currently on disk
    pub fn backups_of(&self, name: &str) -> Vec<PathBuf> {
        let prefix = format!("{name}.backup.");
        let mut found: Vec<PathBuf> = std::fs::read_dir(self.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect();
        found.sort();
        found
    }

    /// Valid settings rooted at this workspace
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.model.api_key = "test-key".to_string();
        settings.paths.repo_root = self.path().to_path_buf();
        settings
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Captures every event published on a bus
///
/// Each event is also pushed through its wire form on arrival; any event
/// that does not decode back to itself fails the next accessor call.
#[derive(Debug)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Event>>>,
    wire_mismatches: Arc<Mutex<Vec<String>>>,
    subscriptions: Vec<Subscription>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let wire_mismatches = Arc::new(Mutex::new(Vec::new()));
        let subscriptions = EventKind::ALL
            .into_iter()
            .map(|kind| {
                let sink = Arc::clone(&events);
                let mismatches = Arc::clone(&wire_mismatches);
                bus.subscribe(kind, move |event| {
                    if let Err(problem) = check_wire(event) {
                        mismatches.lock().push(problem);
                    }
                    sink.lock().push(event.clone());
                    Ok(())
                })
            })
            .collect();
        Self {
            events,
            wire_mismatches,
            subscriptions,
        }
    }

    fn recorded(&self) -> parking_lot::MutexGuard<'_, Vec<Event>> {
        {
            let mismatches = self.wire_mismatches.lock();
            assert!(mismatches.is_empty(), "events broke the wire contract: {mismatches:?}");
        }
        self.events.lock()
    }

    pub fn events(&self) -> Vec<Event> {
        self.recorded().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.recorded().iter().map(Event::kind).collect()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.recorded()
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.of_kind(kind).len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn detach(self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

/// Encode `event`, decode it by name, and compare
fn check_wire(event: &Event) -> Result<(), String> {
    let wire = event.to_wire();
    let name = event.kind().as_str();
    if wire["event"] != name {
        return Err(format!("{name}: wire name is {}", wire["event"]));
    }
    match Event::from_wire(name, wire["payload"].clone()) {
        Ok(decoded) if decoded == *event => Ok(()),
        Ok(decoded) => Err(format!("{name}: decoded as {decoded:?}")),
        Err(err) => Err(format!("{name}: {err}")),
    }
}

/// Shared log of hook invocations
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Records `hook:task[:detail]` for every hook call
#[derive(Debug, Clone)]
pub struct RecordingPlugin {
    name: String,
    calls: CallLog,
}

impl RecordingPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Arc::default(),
        }
    }

    /// Handle to the call log that stays valid after the plugin is registered
    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn before_task(&self, task: &Task) -> anyhow::Result<()> {
        self.calls.lock().push(format!("before_task:{}", task.id));
        Ok(())
    }

    fn after_task(&self, task: &Task, result: &TaskResult) -> anyhow::Result<()> {
        self.calls
            .lock()
            .push(format!("after_task:{}:{}", task.id, result.success));
        Ok(())
    }

    fn on_error(&self, task: &Task, error: &ErrorInfo) -> anyhow::Result<()> {
        self.calls
            .lock()
            .push(format!("on_error:{}:{}", task.id, error.kind));
        Ok(())
    }
}

/// Every hook returns an error
#[derive(Debug, Clone)]
pub struct FailingPlugin {
    name: String,
}

impl FailingPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Plugin for FailingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn before_task(&self, task: &Task) -> anyhow::Result<()> {
        anyhow::bail!("{} refuses {}", self.name, task.id)
    }

    fn after_task(&self, task: &Task, _result: &TaskResult) -> anyhow::Result<()> {
        anyhow::bail!("{} cannot observe {}", self.name, task.id)
    }

    fn on_error(&self, task: &Task, _error: &ErrorInfo) -> anyhow::Result<()> {
        anyhow::bail!("{} cannot report {}", self.name, task.id)
    }
}

/// Panics in `before_task`
#[derive(Debug, Clone)]
pub struct PanickingPlugin {
    name: String,
}

impl PanickingPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Plugin for PanickingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn before_task(&self, task: &Task) -> anyhow::Result<()> {
        panic!("{} blew up on {}", self.name, task.id)
    }
}

/// Always fails, optionally after scribbling over the file
#[derive(Debug, Clone, Default)]
pub struct FailingApplier {
    scribble: Option<String>,
}

impl FailingApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `content` before failing, to prove the rollback restores it
    pub fn after_writing(content: &str) -> Self {
        Self {
            scribble: Some(content.to_string()),
        }
    }
}

#[async_trait]
impl PatchApplier for FailingApplier {
    async fn apply(&self, path: &Path, _patch: &str) -> anyhow::Result<AppliedPatch> {
        if let Some(content) = &self.scribble {
            tokio::fs::write(path, content).await?;
        }
        anyhow::bail!("patch rejected by applier")
    }
}

/// Sleeps before replacing content
///
/// Tracks how many applications are in flight so tests can observe overlap.
#[derive(Debug, Clone)]
pub struct SlowApplier {
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl SlowApplier {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: Arc::default(),
            peak: Arc::default(),
        }
    }

    /// Highest number of concurrent applications observed
    pub fn peak(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }
}

#[async_trait]
impl PatchApplier for SlowApplier {
    async fn apply(&self, path: &Path, patch: &str) -> anyhow::Result<AppliedPatch> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let outcome = ReplaceContentApplier.apply(path, patch).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// A fix submission carrying classification metadata
pub fn classified_fix(
    id: &str,
    file: &str,
    patch: &str,
    class: ProblemClass,
    complexity: FixComplexity,
    files_affected: u32,
) -> TaskSubmission {
    TaskSubmission::fix(file, format!("fix {class} issue in {file}"))
        .with_id(id)
        .with_patch(patch)
        .with_metadata(keys::ERROR_TYPE, class.as_str().into())
        .with_metadata(keys::COMPLEXITY, complexity.as_str().into())
        .with_metadata(keys::FILES_AFFECTED, files_affected.into())
}

/// Simple single-file syntax fix, the common happy path
pub fn syntax_fix(id: &str, file: &str, patch: &str) -> TaskSubmission {
    classified_fix(id, file, patch, ProblemClass::Syntax, FixComplexity::Simple, 1)
}
