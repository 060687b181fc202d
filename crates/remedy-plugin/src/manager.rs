//! Plugin registry and hook dispatch

use crate::{Plugin, PluginError};
use indexmap::IndexMap;
use remedy_events::event::{PluginErrored, PluginLoaded};
use remedy_events::{panic_message, Event, EventBus};
use remedy_model::{ErrorInfo, HookPoint, Task, TaskId, TaskResult};
use serde::Serialize;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Factory = Box<dyn FnOnce() -> anyhow::Result<Box<dyn Plugin>> + Send>;

enum Source {
    Instance(Box<dyn Plugin>),
    Factory { label: String, make: Factory },
}

struct Registration {
    source: Source,
    config: serde_json::Value,
}

/// Explicit registration list; [`PluginManagerBuilder::build`] loads it
pub struct PluginManagerBuilder {
    bus: EventBus,
    registrations: Vec<Registration>,
}

impl PluginManagerBuilder {
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            registrations: Vec::new(),
        }
    }

    /// Register a ready instance with no configuration
    #[must_use]
    pub fn register(self, plugin: impl Plugin + 'static) -> Self {
        self.register_with_config(plugin, serde_json::Value::Null)
    }

    /// Register a ready instance with its configuration
    #[must_use]
    pub fn register_with_config(mut self, plugin: impl Plugin + 'static, config: serde_json::Value) -> Self {
        self.registrations.push(Registration {
            source: Source::Instance(Box::new(plugin)),
            config,
        });
        self
    }

    /// Register a fallible constructor; `label` names it in load failures
    #[must_use]
    pub fn register_factory<F>(mut self, label: impl Into<String>, factory: F, config: serde_json::Value) -> Self
    where
        F: FnOnce() -> anyhow::Result<Box<dyn Plugin>> + Send + 'static,
    {
        self.registrations.push(Registration {
            source: Source::Factory {
                label: label.into(),
                make: Box::new(factory),
            },
            config,
        });
        self
    }

    /// Load every registration in order
    ///
    /// Emits `plugin.loaded` or `plugin.error` per registration. A failure
    /// never stops the rest from loading.
    #[must_use]
    pub fn build(self) -> (PluginManager, LoadReport) {
        let mut slots: IndexMap<String, Arc<PluginSlot>> = IndexMap::new();
        let mut report = LoadReport::default();

        for registration in self.registrations {
            match load_one(registration, &slots) {
                Ok(plugin) => {
                    let name = plugin.name().to_string();
                    let version = plugin.version().to_string();
                    tracing::info!(plugin = %name, %version, "plugin loaded");
                    self.bus.publish(Event::PluginLoaded(PluginLoaded {
                        name: name.clone(),
                        version,
                    }));
                    report.loaded.push(name.clone());
                    slots.insert(
                        name,
                        Arc::new(PluginSlot {
                            plugin,
                            enabled: AtomicBool::new(true),
                        }),
                    );
                }
                Err(err) => {
                    tracing::warn!(plugin = err.plugin(), error = %err, "plugin failed to load");
                    metrics::counter!("remedy_plugin_load_failures_total").increment(1);
                    self.bus.publish(Event::PluginError(PluginErrored {
                        plugin: err.plugin().to_string(),
                        hook: None,
                        task_id: None,
                        message: err.to_string(),
                    }));
                    report.failed.push(err);
                }
            }
        }

        let manager = PluginManager {
            inner: Arc::new(Inner {
                bus: self.bus,
                slots,
            }),
        };
        (manager, report)
    }
}

impl fmt::Debug for PluginManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManagerBuilder")
            .field("registrations", &self.registrations.len())
            .finish_non_exhaustive()
    }
}

fn load_one(
    registration: Registration,
    loaded: &IndexMap<String, Arc<PluginSlot>>,
) -> Result<Box<dyn Plugin>, PluginError> {
    let Registration { source, config } = registration;
    let mut plugin = match source {
        Source::Instance(plugin) => plugin,
        Source::Factory { label, make } => match catch_unwind(AssertUnwindSafe(make)) {
            Ok(Ok(plugin)) => plugin,
            Ok(Err(e)) => {
                return Err(PluginError::FactoryFailed {
                    label,
                    message: format!("{e:#}"),
                })
            }
            Err(panic) => {
                return Err(PluginError::FactoryFailed {
                    label,
                    message: format!("panicked: {}", panic_message(panic.as_ref())),
                })
            }
        },
    };

    let name = plugin.name().to_string();
    if loaded.contains_key(&name) {
        return Err(PluginError::Duplicate(name));
    }
    let init = catch_unwind(AssertUnwindSafe(|| plugin.init(&config)));
    let message = match init {
        Ok(Ok(())) => return Ok(plugin),
        Ok(Err(e)) => format!("{e:#}"),
        Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
    };
    Err(PluginError::InitFailed { name, message })
}

/// Outcome of [`PluginManagerBuilder::build`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Names, in load order
    pub loaded: Vec<String>,
    pub failed: Vec<PluginError>,
}

impl LoadReport {
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

struct PluginSlot {
    plugin: Box<dyn Plugin>,
    enabled: AtomicBool,
}

struct Inner {
    bus: EventBus,
    slots: IndexMap<String, Arc<PluginSlot>>,
}

/// Runs lifecycle hooks across loaded plugins
///
/// The plugin set is fixed at build time; only the enabled flags change.
/// Cheap to clone.
#[derive(Clone)]
pub struct PluginManager {
    inner: Arc<Inner>,
}

impl PluginManager {
    #[must_use]
    pub fn builder(bus: EventBus) -> PluginManagerBuilder {
        PluginManagerBuilder::new(bus)
    }

    /// A manager with no plugins
    #[must_use]
    pub fn empty(bus: EventBus) -> Self {
        PluginManagerBuilder::new(bus).build().0
    }

    /// Before-task hooks of every enabled plugin, in registration order
    pub fn run_before_task(&self, task: &Task) -> HookReport {
        self.run(HookPoint::BeforeTask, &task.id, |p| p.before_task(task))
    }

    /// After-task hooks of every enabled plugin, in registration order
    pub fn run_after_task(&self, task: &Task, result: &TaskResult) -> HookReport {
        self.run(HookPoint::AfterTask, &task.id, |p| p.after_task(task, result))
    }

    /// On-error hooks of every enabled plugin, in registration order
    pub fn run_on_error(&self, task: &Task, error: &ErrorInfo) -> HookReport {
        self.run(HookPoint::OnError, &task.id, |p| p.on_error(task, error))
    }

    fn run<F>(&self, hook: HookPoint, task_id: &TaskId, call: F) -> HookReport
    where
        F: Fn(&dyn Plugin) -> anyhow::Result<()>,
    {
        let mut report = HookReport {
            hook,
            outcomes: Vec::new(),
        };
        for (name, slot) in &self.inner.slots {
            if !slot.enabled.load(Ordering::Acquire) {
                continue;
            }
            let status = match catch_unwind(AssertUnwindSafe(|| call(slot.plugin.as_ref()))) {
                Ok(Ok(())) => HookStatus::Ok,
                Ok(Err(e)) => HookStatus::Failed(format!("{e:#}")),
                Err(panic) => HookStatus::Panicked(panic_message(panic.as_ref())),
            };
            if let Some(message) = status.failure_message() {
                tracing::warn!(plugin = %name, %hook, %task_id, error = %message, "plugin hook failed");
                metrics::counter!("remedy_plugin_hook_failures_total", "hook" => hook.as_str()).increment(1);
                self.inner.bus.publish(Event::PluginError(PluginErrored {
                    plugin: name.clone(),
                    hook: Some(hook),
                    task_id: Some(task_id.clone()),
                    message,
                }));
            }
            report.outcomes.push(HookOutcome {
                plugin: name.clone(),
                status,
            });
        }
        report
    }

    /// Resume calling the plugin's hooks
    ///
    /// # Errors
    /// [`PluginError::NotFound`] for an unknown name.
    pub fn enable(&self, name: &str) -> Result<(), PluginError> {
        self.slot(name)?.enabled.store(true, Ordering::Release);
        tracing::debug!(plugin = name, "plugin enabled");
        Ok(())
    }

    /// Stop calling the plugin's hooks without unloading it
    ///
    /// # Errors
    /// [`PluginError::NotFound`] for an unknown name.
    pub fn disable(&self, name: &str) -> Result<(), PluginError> {
        self.slot(name)?.enabled.store(false, Ordering::Release);
        tracing::debug!(plugin = name, "plugin disabled");
        Ok(())
    }

    /// # Errors
    /// [`PluginError::NotFound`] for an unknown name.
    pub fn is_enabled(&self, name: &str) -> Result<bool, PluginError> {
        Ok(self.slot(name)?.enabled.load(Ordering::Acquire))
    }

    /// Loaded plugins, in registration order
    #[must_use]
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.inner
            .slots
            .iter()
            .map(|(name, slot)| PluginInfo {
                name: name.clone(),
                version: slot.plugin.version().to_string(),
                enabled: slot.enabled.load(Ordering::Acquire),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    fn slot(&self, name: &str) -> Result<&PluginSlot, PluginError> {
        self.inner
            .slots
            .get(name)
            .map(|slot| &**slot)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))
    }
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.inner.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub enabled: bool,
}

/// How one plugin's hook went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookStatus {
    Ok,
    /// Returned an error
    Failed(String),
    /// Panicked; the panic was contained
    Panicked(String),
}

impl HookStatus {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, HookStatus::Ok)
    }

    fn failure_message(&self) -> Option<String> {
        match self {
            HookStatus::Ok => None,
            HookStatus::Failed(m) => Some(m.clone()),
            HookStatus::Panicked(m) => Some(format!("panicked: {m}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub plugin: String,
    pub status: HookStatus,
}

/// Every enabled plugin's outcome for one hook point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub hook: HookPoint,
    pub outcomes: Vec<HookOutcome>,
}

impl HookReport {
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &HookOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use remedy_events::EventKind;
    use remedy_model::{FailureKind, TaskType};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        fail_before: bool,
        panic_after: bool,
    }

    impl Probe {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                fail_before: false,
                panic_after: false,
            }
        }
    }

    impl Plugin for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn before_task(&self, task: &Task) -> anyhow::Result<()> {
            self.log.lock().push(format!("{}:before:{}", self.name, task.id));
            if self.fail_before {
                anyhow::bail!("{} refuses", self.name);
            }
            Ok(())
        }

        fn after_task(&self, _task: &Task, _result: &TaskResult) -> anyhow::Result<()> {
            self.log.lock().push(format!("{}:after", self.name));
            if self.panic_after {
                panic!("{} exploded", self.name);
            }
            Ok(())
        }

        fn on_error(&self, _task: &Task, error: &ErrorInfo) -> anyhow::Result<()> {
            self.log.lock().push(format!("{}:error:{}", self.name, error.kind));
            Ok(())
        }
    }

    struct Picky;

    impl Plugin for Picky {
        fn name(&self) -> &str {
            "picky"
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        fn init(&mut self, config: &serde_json::Value) -> anyhow::Result<()> {
            anyhow::ensure!(config.get("token").is_some(), "missing token");
            Ok(())
        }
    }

    fn task() -> Task {
        Task::new("T1", TaskType::Fix, "a.txt", "fix")
    }

    fn result() -> TaskResult {
        TaskResult::success("T1".into(), "ok", 95, false)
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let log = Log::default();
        let (mgr, report) = PluginManager::builder(EventBus::new())
            .register(Probe::new("a", &log))
            .register(Probe::new("b", &log))
            .build();
        assert!(report.is_clean());
        assert_eq!(report.loaded, ["a", "b"]);

        assert!(mgr.run_before_task(&task()).all_ok());
        assert!(mgr.run_after_task(&task(), &result()).all_ok());
        assert_eq!(*log.lock(), ["a:before:T1", "b:before:T1", "a:after", "b:after"]);
    }

    #[test]
    fn failing_and_panicking_hooks_are_contained() {
        let log = Log::default();
        let mut failing = Probe::new("failing", &log);
        failing.fail_before = true;
        failing.panic_after = true;

        let bus = EventBus::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        bus.subscribe(EventKind::PluginError, move |e| {
            sink.lock().push(e.clone());
            Ok(())
        });

        let (mgr, _) = PluginManager::builder(bus)
            .register(failing)
            .register(Probe::new("steady", &log))
            .build();

        let before = mgr.run_before_task(&task());
        assert!(!before.all_ok());
        assert_eq!(before.failures().count(), 1);
        assert!(matches!(&before.outcomes[0].status, HookStatus::Failed(m) if m.contains("refuses")));

        let after = mgr.run_after_task(&task(), &result());
        assert!(matches!(&after.outcomes[0].status, HookStatus::Panicked(m) if m.contains("exploded")));
        assert!(after.outcomes[1].status.is_ok());

        assert_eq!(
            *log.lock(),
            ["failing:before:T1", "steady:before:T1", "failing:after", "steady:after"]
        );
        let errors = errors.lock();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors[0],
            Event::PluginError(p) if p.hook == Some(HookPoint::BeforeTask) && p.plugin == "failing"
        ));
    }

    #[test]
    fn disabled_plugins_are_skipped() {
        let log = Log::default();
        let (mgr, _) = PluginManager::builder(EventBus::new())
            .register(Probe::new("a", &log))
            .register(Probe::new("b", &log))
            .build();

        mgr.disable("a").unwrap();
        assert!(!mgr.is_enabled("a").unwrap());
        let err = ErrorInfo::new(FailureKind::PatchFailed, "nope");
        let report = mgr.run_on_error(&task(), &err);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(*log.lock(), ["b:error:patch_failed"]);

        mgr.enable("a").unwrap();
        assert_eq!(mgr.run_on_error(&task(), &err).outcomes.len(), 2);
        assert!(matches!(mgr.disable("zzz"), Err(PluginError::NotFound(_))));
    }

    #[test]
    fn load_failures_do_not_abort_others() {
        let log = Log::default();
        let bus = EventBus::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::PluginLoaded, EventKind::PluginError] {
            let sink = Arc::clone(&events);
            bus.subscribe(kind, move |e| {
                sink.lock().push(e.kind());
                Ok(())
            });
        }

        let (mgr, report) = PluginManager::builder(bus)
            .register(Picky)
            .register_factory("broken", || anyhow::bail!("no such module"), serde_json::Value::Null)
            .register(Probe::new("a", &log))
            .register(Probe::new("a", &log))
            .register_with_config(Picky, serde_json::json!({"token": "t"}))
            .build();

        assert_eq!(report.loaded, ["a", "picky"]);
        assert_eq!(report.failed.len(), 3);
        assert!(matches!(&report.failed[0], PluginError::InitFailed { name, .. } if name == "picky"));
        assert!(matches!(&report.failed[1], PluginError::FactoryFailed { label, .. } if label == "broken"));
        assert!(matches!(&report.failed[2], PluginError::Duplicate(n) if n == "a"));
        assert_eq!(mgr.len(), 2);
        assert_eq!(
            *events.lock(),
            [
                EventKind::PluginError,
                EventKind::PluginError,
                EventKind::PluginLoaded,
                EventKind::PluginError,
                EventKind::PluginLoaded,
            ]
        );
    }

    #[test]
    fn factory_success_and_panic() {
        let log = Log::default();
        let probe_log = Arc::clone(&log);
        let (mgr, report) = PluginManager::builder(EventBus::new())
            .register_factory(
                "probe",
                move || Ok(Box::new(Probe::new("made", &probe_log)) as Box<dyn Plugin>),
                serde_json::Value::Null,
            )
            .register_factory("bomb", || panic!("factory bomb"), serde_json::Value::Null)
            .build();

        assert_eq!(report.loaded, ["made"]);
        assert!(matches!(&report.failed[0], PluginError::FactoryFailed { message, .. } if message.contains("factory bomb")));
        assert_eq!(mgr.plugins()[0].version, "1.0.0");
    }

    #[test]
    fn empty_manager_reports_nothing() {
        let mgr = PluginManager::empty(EventBus::new());
        assert!(mgr.is_empty());
        assert!(mgr.run_before_task(&task()).outcomes.is_empty());
    }
}
