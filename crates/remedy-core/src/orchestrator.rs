//! Remediation pipeline
//!
//! Ties the components together for one task at a time per file:
//! - Before-task hooks
//! - Confidence assessment and the review gate
//! - Integrity check, backup, patch, post-validation
//! - Rollback and failure reporting, or completion
//!
//! Every task that starts ends in exactly one [`TaskResult`]. Misuse of the
//! orchestrator (unknown id, task already run) is a [`PipelineError`]; a task
//! that fails is a failed result, never an `Err`.

use crate::applier::{AppliedPatch, PatchApplier, ReplaceContentApplier};
use crate::error::{PipelineError, TaskFailure};
use crate::health::{SystemHealth, TaskCounts};
use crate::locks::FileLocks;
use crate::store::TaskStore;
use futures::stream::{self, StreamExt};
use remedy_config::{ConfigHandle, Settings};
use remedy_events::event::{
    PatchApplied, SystemError, TaskAssigned, TaskCompleted, TaskFailed, TaskNeedsClarification,
    TaskStarted,
};
use remedy_events::{Event, EventBus};
use remedy_model::{
    ErrorInfo, FailureKind, FileChange, Task, TaskId, TaskMetrics, TaskResult, TaskStatus,
    TaskSubmission,
};
use remedy_plugin::PluginManager;
use remedy_rollback::RollbackManager;
use remedy_safety::{
    run_validators, Assessment, IntegrityVerdict, PostValidator, RemediationPlan, SafetyEngine,
    SecurityPatternValidator,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    config: ConfigHandle,
    bus: Option<EventBus>,
    plugins: Option<PluginManager>,
    applier: Option<Arc<dyn PatchApplier>>,
    validators: Vec<Arc<dyn PostValidator>>,
    default_validators: bool,
}

impl OrchestratorBuilder {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::with_config(ConfigHandle::new(settings))
    }

    /// Read settings through a shared handle
    ///
    /// Each task run takes one snapshot when it starts, so a reload through
    /// the handle applies from the next task on.
    #[must_use]
    pub fn with_config(config: ConfigHandle) -> Self {
        Self {
            config,
            bus: None,
            plugins: None,
            applier: None,
            validators: Vec::new(),
            default_validators: true,
        }
    }

    /// Share an existing bus
    ///
    /// Plugins passed to [`Self::with_plugins`] should be built on the same
    /// bus so their `plugin.error` events reach the same subscribers.
    #[must_use]
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    #[must_use]
    pub fn with_plugins(mut self, plugins: PluginManager) -> Self {
        self.plugins = Some(plugins);
        self
    }

    /// Replace the default [`ReplaceContentApplier`]
    #[must_use]
    pub fn with_applier(mut self, applier: impl PatchApplier + 'static) -> Self {
        self.applier = Some(Arc::new(applier));
        self
    }

    /// Add a post-patch validator
    #[must_use]
    pub fn with_validator(mut self, validator: impl PostValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Drop the built-in [`SecurityPatternValidator`]
    #[must_use]
    pub fn without_default_validators(mut self) -> Self {
        self.default_validators = false;
        self
    }

    #[must_use]
    pub fn build(self) -> Orchestrator {
        let bus = self.bus.unwrap_or_default();
        let plugins = self
            .plugins
            .unwrap_or_else(|| PluginManager::empty(bus.clone()));
        let applier = self
            .applier
            .unwrap_or_else(|| Arc::new(ReplaceContentApplier));

        let mut validators: Vec<Arc<dyn PostValidator>> = Vec::new();
        if self.default_validators {
            validators.push(Arc::new(SecurityPatternValidator::new()));
        }
        validators.extend(self.validators);

        tracing::info!(
            plugins = plugins.len(),
            validators = validators.len(),
            max_concurrent = self.config.current().execution.max_concurrent_tasks,
            "orchestrator ready"
        );

        Orchestrator {
            inner: Arc::new(Inner {
                config: self.config,
                rollback: RollbackManager::new(bus.clone()),
                safety: SafetyEngine::new(),
                bus,
                plugins,
                applier,
                validators,
                store: TaskStore::new(),
                locks: FileLocks::new(),
            }),
        }
    }
}

impl fmt::Debug for OrchestratorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorBuilder")
            .field("validators", &self.validators.len())
            .field("default_validators", &self.default_validators)
            .finish_non_exhaustive()
    }
}

struct Inner {
    config: ConfigHandle,
    bus: EventBus,
    plugins: PluginManager,
    safety: SafetyEngine,
    rollback: RollbackManager,
    applier: Arc<dyn PatchApplier>,
    validators: Vec<Arc<dyn PostValidator>>,
    store: TaskStore,
    locks: FileLocks,
}

/// The remediation pipeline
///
/// Cheap to clone; clones share every registry.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("tasks", &self.inner.store.len())
            .field("plugins", &self.inner.plugins.len())
            .field("validators", &self.inner.validators.len())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn builder(settings: Settings) -> OrchestratorBuilder {
        OrchestratorBuilder::new(settings)
    }

    /// Accept a submission as a pending task
    ///
    /// # Errors
    /// [`PipelineError::Model`] for an invalid submission,
    /// [`PipelineError::DuplicateTask`] for a reused id.
    pub fn submit(&self, submission: TaskSubmission) -> Result<TaskId, PipelineError> {
        self.submit_task(submission.into_task()?)
    }

    /// Accept an already-built task
    ///
    /// # Errors
    /// [`PipelineError::NotPending`] unless the task is pending,
    /// [`PipelineError::DuplicateTask`] for a reused id.
    pub fn submit_task(&self, task: Task) -> Result<TaskId, PipelineError> {
        if task.status != TaskStatus::Pending {
            return Err(PipelineError::NotPending {
                id: task.id,
                status: task.status,
            });
        }

        let id = task.id.clone();
        let path = self.resolve(&task.file);
        let snapshot = match self.inner.safety.baseline(&path) {
            Ok(hash) => Some(hash),
            Err(err) => {
                tracing::debug!(task = %id, error = %err, "no snapshot at submission");
                None
            }
        };
        let assigned = TaskAssigned {
            task_id: id.clone(),
            file: task.file.clone(),
            task_type: task.task_type,
            priority: task.priority,
            assigned_to: task.assigned_to,
        };
        self.inner.store.insert_with_snapshot(task, snapshot)?;

        tracing::info!(task = %id, file = %assigned.file.display(), "task assigned");
        metrics::counter!("remedy_tasks_submitted_total").increment(1);
        self.inner.bus.publish(Event::TaskAssigned(assigned));
        Ok(id)
    }

    /// Run one pending task to its terminal state
    ///
    /// Holds the lock for the task's file for the whole run.
    ///
    /// # Errors
    /// [`PipelineError::UnknownTask`], [`PipelineError::NotPending`], or a
    /// bookkeeping error. Task failures are returned as `Ok` with
    /// `success == false`.
    pub async fn execute(&self, id: &TaskId) -> Result<TaskResult, PipelineError> {
        let file = self
            .inner
            .store
            .get(id)
            .ok_or_else(|| PipelineError::UnknownTask(id.clone()))?
            .file;
        let settings = self.inner.config.current();
        let path = resolve_in(&settings, &file);
        let _guard = self.inner.locks.lock(&path).await;
        let started = Instant::now();

        // Re-check under the lock: a concurrent caller may have run it already
        let task = self.inner.store.update(id, |task| {
            if task.status != TaskStatus::Pending {
                return Err(PipelineError::NotPending {
                    id: task.id.clone(),
                    status: task.status,
                });
            }
            task.transition(TaskStatus::InProgress)?;
            Ok(task.clone())
        })?;

        tracing::info!(task = %id, file = %path.display(), "task started");
        self.inner.bus.publish(Event::TaskStarted(TaskStarted {
            task_id: id.clone(),
            file: path.clone(),
        }));

        let before = self.inner.plugins.run_before_task(&task);
        if !before.all_ok() {
            tracing::debug!(task = %id, failures = before.failures().count(), "before-task hooks reported failures");
        }

        let plan = match RemediationPlan::from_task(&task) {
            Ok(plan) => plan,
            Err(err) => return self.park(id, &path, err.to_string(), 0, started),
        };
        let assessment = plan.assess();
        tracing::debug!(
            task = %id,
            class = %plan.error_type,
            complexity = %plan.complexity,
            files = plan.files_affected,
            score = assessment.confidence_score,
            review = assessment.requires_human_review,
            "assessed remediation"
        );

        let Some(patch) = task.patch.as_deref() else {
            return self.park(
                id,
                &path,
                "task has no patch to apply".to_string(),
                assessment.confidence_score,
                started,
            );
        };
        if settings.execution.hold_for_review && assessment.requires_human_review {
            let reason = format!(
                "confidence {} requires human review before applying",
                assessment.confidence_score
            );
            return self.park(id, &path, reason, assessment.confidence_score, started);
        }

        let budget_ms = settings.execution.patch_timeout_ms;
        match self.apply_guarded(id, &path, patch, budget_ms).await {
            Ok(applied) => self.complete(id, &path, &plan, assessment, applied, started),
            Err(failure) => self.fail(id, &path, &plan, failure, started),
        }
    }

    /// Run several tasks, at most `max_concurrent_tasks` at a time
    ///
    /// Results come back in input order. Tasks on the same file still
    /// serialize on the file lock.
    pub async fn execute_all<I>(&self, ids: I) -> Vec<(TaskId, Result<TaskResult, PipelineError>)>
    where
        I: IntoIterator<Item = TaskId>,
    {
        let limit = self.inner.config.current().execution.max_concurrent_tasks.max(1);
        stream::iter(ids)
            .map(|id| async move {
                let outcome = self.execute(&id).await;
                (id, outcome)
            })
            .buffered(limit)
            .collect()
            .await
    }

    /// Integrity check, backup, patch, post-validation
    ///
    /// Any failure after the backup exists leaves the backup live for
    /// [`Self::fail`] to restore.
    async fn apply_guarded(
        &self,
        id: &TaskId,
        path: &Path,
        patch: &str,
        budget_ms: u64,
    ) -> Result<AppliedPatch, TaskFailure> {
        let verdict = match self.inner.store.snapshot(id) {
            Some(snapshot) => self.inner.safety.verify_since(path, snapshot)?,
            None => self.inner.safety.pre_execution_check(path)?,
        };
        if let IntegrityVerdict::Drifted { expected, actual } = verdict {
            return Err(TaskFailure::new(
                FailureKind::IntegrityDrift,
                format!(
                    "{} changed since it was last inspected (expected {}, found {})",
                    path.display(),
                    expected.short(),
                    actual.short()
                ),
            ));
        }

        let backup = self.inner.rollback.create_backup(path)?;
        self.inner
            .store
            .update(id, |task| {
                task.backup_path = Some(backup.clone());
                task.touch();
                Ok(())
            })
            .map_err(|e| TaskFailure::new(FailureKind::Internal, e.to_string()))?;

        let patch_started = Instant::now();
        let outcome = match tokio::time::timeout(
            Duration::from_millis(budget_ms),
            self.inner.applier.apply(path, patch),
        )
        .await
        {
            Ok(Ok(applied)) => Ok(applied),
            Ok(Err(err)) => Err(TaskFailure::new(FailureKind::PatchFailed, format!("{err:#}"))),
            Err(_) => Err(TaskFailure::new(
                FailureKind::Timeout,
                format!("patch did not finish within {budget_ms}ms"),
            )),
        };
        metrics::histogram!("remedy_patch_duration_ms").record(patch_started.elapsed().as_secs_f64() * 1000.0);

        self.inner.bus.publish(Event::PatchApplied(PatchApplied {
            task_id: id.clone(),
            file: path.to_path_buf(),
            success: outcome.is_ok(),
        }));
        let applied = outcome?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            TaskFailure::new(
                FailureKind::Unreadable,
                format!("cannot read {} after patch: {e}", path.display()),
            )
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let findings = run_validators(&self.inner.validators, path, &content);
        if !findings.is_empty() {
            let summary = findings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TaskFailure::new(FailureKind::ValidationFailed, summary));
        }

        Ok(applied)
    }

    fn complete(
        &self,
        id: &TaskId,
        path: &Path,
        plan: &RemediationPlan,
        assessment: Assessment,
        applied: AppliedPatch,
        started: Instant,
    ) -> Result<TaskResult, PipelineError> {
        if let Err(err) = self.inner.safety.update_hash(path) {
            tracing::warn!(task = %id, error = %err, "could not refresh baseline hash");
        }
        if let Err(err) = self.inner.rollback.cleanup_backup(path) {
            tracing::warn!(task = %id, error = %err, "could not discard backup");
        }

        let task = self.inner.store.update(id, |task| {
            task.transition(TaskStatus::Completed)?;
            task.backup_path = None;
            Ok(task.clone())
        })?;

        let execution_time = millis(started.elapsed());
        let mut result = TaskResult::success(
            id.clone(),
            format!("patched {}", path.display()),
            assessment.confidence_score,
            assessment.requires_human_review,
        )
        .with_change(FileChange::modified(path, applied.lines_changed))
        .with_metrics(TaskMetrics {
            execution_time,
            lines_of_code: applied.lines_of_code,
            complexity: plan.complexity,
            ..TaskMetrics::default()
        });
        if assessment.requires_human_review {
            result = result.with_warning(format!(
                "confidence {} requires human review",
                assessment.confidence_score
            ));
        }
        self.inner.store.record_result(result.clone())?;

        self.inner.plugins.run_after_task(&task, &result);

        tracing::info!(
            task = %id,
            score = result.confidence_score,
            review = result.requires_human_review,
            execution_ms = execution_time,
            "task completed"
        );
        metrics::counter!("remedy_tasks_total", "outcome" => "completed").increment(1);
        self.inner.bus.publish(Event::TaskCompleted(TaskCompleted {
            task_id: id.clone(),
            file: path.to_path_buf(),
            confidence_score: result.confidence_score,
            requires_human_review: result.requires_human_review,
            execution_time,
        }));
        Ok(result)
    }

    fn fail(
        &self,
        id: &TaskId,
        path: &Path,
        plan: &RemediationPlan,
        failure: TaskFailure,
        started: Instant,
    ) -> Result<TaskResult, PipelineError> {
        let rolled_back = self.inner.rollback.has_backup(path)
            && match self.inner.rollback.restore_on_failure(path, &failure.message) {
                Ok(_) => true,
                Err(err) => {
                    tracing::error!(task = %id, error = %err, "rollback failed");
                    false
                }
            };

        let task = self.inner.store.update(id, |task| {
            task.transition(TaskStatus::Failed)?;
            task.backup_path = None;
            Ok(task.clone())
        })?;

        let error = ErrorInfo::new(failure.kind, failure.message.clone())
            .for_task(id.clone())
            .with_file(path);
        self.inner.bus.publish(Event::SystemError(SystemError {
            error: error.clone(),
        }));

        let result = TaskResult::failure(id.clone(), error.clone()).with_metrics(TaskMetrics {
            execution_time: millis(started.elapsed()),
            complexity: plan.complexity,
            ..TaskMetrics::default()
        });
        self.inner.store.record_result(result.clone())?;

        self.inner.plugins.run_after_task(&task, &result);
        self.inner.plugins.run_on_error(&task, &error);

        tracing::warn!(task = %id, kind = %failure.kind, rolled_back, error = %failure.message, "task failed");
        metrics::counter!("remedy_tasks_total", "outcome" => "failed").increment(1);
        self.inner.bus.publish(Event::TaskFailed(TaskFailed {
            task_id: id.clone(),
            file: path.to_path_buf(),
            kind: failure.kind,
            message: failure.message,
            rolled_back,
        }));
        Ok(result)
    }

    /// End the task as `needs_clarification` without touching the file
    fn park(
        &self,
        id: &TaskId,
        path: &Path,
        reason: String,
        confidence_score: u8,
        started: Instant,
    ) -> Result<TaskResult, PipelineError> {
        let task = self.inner.store.update(id, |task| {
            task.transition(TaskStatus::NeedsClarification)?;
            Ok(task.clone())
        })?;

        let result = TaskResult {
            task_id: id.clone(),
            success: false,
            message: reason.clone(),
            changes: Vec::new(),
            metrics: TaskMetrics {
                execution_time: millis(started.elapsed()),
                ..TaskMetrics::default()
            },
            errors: Vec::new(),
            warnings: vec![reason.clone()],
            confidence_score,
            requires_human_review: true,
        };
        self.inner.store.record_result(result.clone())?;

        self.inner.plugins.run_after_task(&task, &result);

        tracing::info!(task = %id, %reason, "task needs clarification");
        metrics::counter!("remedy_tasks_total", "outcome" => "needs_clarification").increment(1);
        self.inner
            .bus
            .publish(Event::TaskNeedsClarification(TaskNeedsClarification {
                task_id: id.clone(),
                file: path.to_path_buf(),
                reason,
            }));
        Ok(result)
    }

    /// Current health from task totals and recorded results
    #[must_use]
    pub fn health(&self) -> SystemHealth {
        let store = &self.inner.store;
        let counts = TaskCounts {
            total: store.len(),
            pending: store.count_with_status(TaskStatus::Pending),
            in_progress: store.count_with_status(TaskStatus::InProgress),
            completed: store.count_with_status(TaskStatus::Completed),
            failed: store.count_with_status(TaskStatus::Failed),
            needs_clarification: store.count_with_status(TaskStatus::NeedsClarification),
        };
        SystemHealth::compute(counts, &store.results())
    }

    /// Relative task files resolve against the repository root
    #[must_use]
    pub fn resolve(&self, file: &Path) -> PathBuf {
        resolve_in(&self.inner.config.current(), file)
    }

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.inner.store.get(id)
    }

    #[must_use]
    pub fn result(&self, id: &TaskId) -> Option<TaskResult> {
        self.inner.store.result(id)
    }

    /// Current settings snapshot
    #[must_use]
    pub fn settings(&self) -> Arc<Settings> {
        self.inner.config.current()
    }

    /// Handle for swapping settings at runtime
    #[must_use]
    pub fn config(&self) -> &ConfigHandle {
        &self.inner.config
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    #[must_use]
    pub fn plugins(&self) -> &PluginManager {
        &self.inner.plugins
    }

    #[must_use]
    pub fn safety(&self) -> &SafetyEngine {
        &self.inner.safety
    }

    #[must_use]
    pub fn rollback(&self) -> &RollbackManager {
        &self.inner.rollback
    }
}

fn resolve_in(settings: &Settings, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        settings.paths.repo_root.join(file)
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use remedy_model::task::keys;
    use serde_json::json;
    use tempfile::TempDir;

    fn orchestrator(dir: &TempDir) -> Orchestrator {
        let mut settings = Settings::default();
        settings.paths.repo_root = dir.path().to_path_buf();
        Orchestrator::builder(settings).build()
    }

    #[tokio::test]
    async fn unknown_task_is_an_error() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let err = orch.execute(&TaskId::from("missing")).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownTask(_)));
    }

    #[tokio::test]
    async fn task_runs_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old\n").unwrap();
        let orch = orchestrator(&dir);
        let id = orch
            .submit(TaskSubmission::fix("a.txt", "fix").with_id("T1").with_patch("new\n"))
            .unwrap();

        assert!(orch.execute(&id).await.unwrap().success);
        let err = orch.execute(&id).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NotPending { status: TaskStatus::Completed, .. }
        ));
    }

    #[tokio::test]
    async fn missing_patch_parks_task() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old\n").unwrap();
        let orch = orchestrator(&dir);
        let id = orch.submit(TaskSubmission::fix("a.txt", "describe only")).unwrap();

        let result = orch.execute(&id).await.unwrap();
        assert!(!result.success);
        assert!(result.requires_human_review);
        assert_eq!(orch.task(&id).unwrap().status, TaskStatus::NeedsClarification);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "old\n");
    }

    #[tokio::test]
    async fn invalid_plan_parks_task() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old\n").unwrap();
        let orch = orchestrator(&dir);
        let id = orch
            .submit(
                TaskSubmission::fix("a.txt", "fix")
                    .with_patch("new\n")
                    .with_metadata(keys::COMPLEXITY, json!("heroic")),
            )
            .unwrap();

        let result = orch.execute(&id).await.unwrap();
        assert!(!result.success);
        assert_eq!(orch.task(&id).unwrap().status, TaskStatus::NeedsClarification);
        assert!(!orch.rollback().has_backup(&dir.path().join("a.txt")));
    }

    #[tokio::test]
    async fn missing_file_fails_without_rollback() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let id = orch
            .submit(TaskSubmission::fix("ghost.txt", "fix").with_patch("new\n"))
            .unwrap();

        let result = orch.execute(&id).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.errors[0].kind, FailureKind::FileNotFound);
        assert_eq!(orch.task(&id).unwrap().status, TaskStatus::Failed);
    }

    struct RawBytesApplier(&'static [u8]);

    #[async_trait::async_trait]
    impl PatchApplier for RawBytesApplier {
        async fn apply(&self, path: &Path, _patch: &str) -> anyhow::Result<AppliedPatch> {
            tokio::fs::write(path, self.0).await?;
            Ok(AppliedPatch::default())
        }
    }

    fn raw_bytes_orchestrator(dir: &TempDir, bytes: &'static [u8]) -> Orchestrator {
        let mut settings = Settings::default();
        settings.paths.repo_root = dir.path().to_path_buf();
        Orchestrator::builder(settings)
            .with_applier(RawBytesApplier(bytes))
            .build()
    }

    #[tokio::test]
    async fn non_utf8_output_is_still_validated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("legacy.js"), "old\n").unwrap();

        let clean = raw_bytes_orchestrator(&dir, b"caf\xe9();\n");
        let id = clean
            .submit(TaskSubmission::fix("legacy.js", "fix").with_patch("unused"))
            .unwrap();
        assert!(clean.execute(&id).await.unwrap().success);

        std::fs::write(dir.path().join("legacy.js"), "old\n").unwrap();
        let dirty = raw_bytes_orchestrator(&dir, b"caf\xe9();\neval(x);\n");
        let id = dirty
            .submit(TaskSubmission::fix("legacy.js", "fix").with_patch("unused"))
            .unwrap();
        let result = dirty.execute(&id).await.unwrap();
        assert_eq!(result.errors[0].kind, FailureKind::ValidationFailed);
        assert_eq!(std::fs::read_to_string(dir.path().join("legacy.js")).unwrap(), "old\n");
    }

    #[test]
    fn relative_paths_resolve_against_repo_root() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        assert_eq!(orch.resolve(Path::new("src/a.rs")), dir.path().join("src/a.rs"));
        let abs = dir.path().join("b.rs");
        assert_eq!(orch.resolve(&abs), abs);
    }

    #[test]
    fn submit_rejects_non_pending_task() {
        let dir = TempDir::new().unwrap();
        let orch = orchestrator(&dir);
        let mut task = Task::new("T1", remedy_model::TaskType::Fix, "a.txt", "fix");
        task.transition(TaskStatus::InProgress).unwrap();
        assert!(matches!(
            orch.submit_task(task),
            Err(PipelineError::NotPending { .. })
        ));
    }
}
