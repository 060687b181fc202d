//! Synchronous, isolated event delivery

use crate::{Event, EventKind};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Subscriber callback
pub type Handler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// Identity of one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Entry {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    entries: RwLock<Vec<Entry>>,
    next_id: AtomicU64,
}

impl Inner {
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner").finish_non_exhaustive()
    }
}

/// In-process publish/subscribe channel over the closed [`EventKind`] set
///
/// Delivery is synchronous on the publisher's stack, in registration order.
/// Handlers are snapshotted before delivery, so a handler may subscribe,
/// unsubscribe, or publish without deadlocking. Events with no subscribers
/// are dropped. Cloning is cheap and clones share registrations.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Create a new, empty bus
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`
    ///
    /// Dropping the returned [`Subscription`] does not unsubscribe.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.entries.write().push(Entry {
            id,
            kind,
            handler: Arc::new(handler),
        });
        tracing::trace!(%id, event = kind.as_str(), "subscribed");
        Subscription {
            id,
            kind,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a registration; returns whether it was still present
    ///
    /// Idempotent: removing twice is not an error.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove(id)
    }

    /// Number of handlers currently registered for `kind`
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner
            .entries
            .read()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Deliver `event` to every handler registered for its kind
    ///
    /// Each handler runs in isolation: an error or panic is logged and
    /// recorded in the report, and delivery continues with the next handler.
    /// Nothing propagates to the caller.
    pub fn publish(&self, event: Event) -> DeliveryReport {
        let kind = event.kind();
        let targets: Vec<(SubscriptionId, Handler)> = self
            .inner
            .entries
            .read()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| (e.id, Arc::clone(&e.handler)))
            .collect();

        metrics::counter!("remedy_events_published_total", "event" => kind.as_str()).increment(1);

        let mut report = DeliveryReport {
            kind,
            delivered: 0,
            failures: Vec::new(),
        };
        for (id, handler) in targets {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&event)));
            let message = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => format!("handler panicked: {}", panic_message(panic.as_ref())),
            };
            tracing::warn!(subscription = %id, event = kind.as_str(), error = %message, "event handler failed");
            metrics::counter!("remedy_event_handler_failures_total", "event" => kind.as_str())
                .increment(1);
            report.failures.push(DeliveryFailure {
                subscription: id,
                message,
            });
        }
        tracing::debug!(
            event = kind.as_str(),
            delivered = report.delivered,
            failed = report.failures.len(),
            "event published"
        );
        report
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.entries.read().len())
            .finish()
    }
}

/// Capability to remove one registration
///
/// Holds the bus weakly; unsubscribing after the bus is gone is a no-op.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    bus: Weak<Inner>,
}

impl Subscription {
    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the registration; returns whether it was still present
    pub fn unsubscribe(&self) -> bool {
        self.bus.upgrade().is_some_and(|inner| inner.remove(self.id))
    }
}

/// A handler that failed during one publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub subscription: SubscriptionId,
    pub message: String,
}

/// Outcome of one [`EventBus::publish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub kind: EventKind,
    /// Handlers that returned `Ok`
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    /// Handlers invoked, successful or not
    #[inline]
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Best-effort text of a caught panic payload
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{PluginLoaded, TaskStarted};
    use parking_lot::Mutex;

    fn started() -> Event {
        Event::TaskStarted(TaskStarted {
            task_id: "T1".into(),
            file: "a.txt".into(),
        })
    }

    fn loaded() -> Event {
        Event::PluginLoaded(PluginLoaded {
            name: "p".into(),
            version: "1".into(),
        })
    }

    #[test]
    fn delivers_in_registration_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let seen = Arc::clone(&seen);
            bus.subscribe(EventKind::TaskStarted, move |_| {
                seen.lock().push(n);
                Ok(())
            });
        }
        let report = bus.publish(started());
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
        assert_eq!(report.delivered, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn failing_subscriber_does_not_stop_the_rest() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for n in 0..5 {
            let seen = Arc::clone(&seen);
            bus.subscribe(EventKind::TaskStarted, move |_| {
                seen.lock().push(n);
                match n {
                    1 => anyhow::bail!("subscriber one failed"),
                    3 => panic!("subscriber three panicked"),
                    _ => Ok(()),
                }
            });
        }
        let report = bus.publish(started());

        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
        assert_eq!(report.delivered, 3);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.attempted(), 5);
        assert!(report.failures[0].message.contains("subscriber one failed"));
        assert!(report.failures[1].message.contains("subscriber three panicked"));
    }

    #[test]
    fn only_matching_kind_is_delivered() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));
        let h = Arc::clone(&hits);
        bus.subscribe(EventKind::PluginLoaded, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        bus.publish(started());
        bus.publish(loaded());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unpublished_kind_is_dropped() {
        let bus = EventBus::new();
        let report = bus.publish(started());
        assert_eq!(report.attempted(), 0);

        // A later subscriber sees nothing from before it registered.
        let hits = Arc::new(AtomicU64::new(0));
        let h = Arc::clone(&hits);
        bus.subscribe(EventKind::TaskStarted, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventKind::TaskStarted, |_| Ok(()));
        assert_eq!(bus.subscriber_count(EventKind::TaskStarted), 1);

        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert!(!bus.unsubscribe(sub.id()));
        assert_eq!(bus.subscriber_count(EventKind::TaskStarted), 0);
    }

    #[test]
    fn unsubscribe_after_bus_dropped_is_noop() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventKind::TaskStarted, |_| Ok(()));
        drop(bus);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn handler_may_unsubscribe_itself_reentrantly() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicU64::new(0));

        let (s, h) = (Arc::clone(&slot), Arc::clone(&hits));
        let sub = bus.subscribe(EventKind::TaskStarted, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = s.lock().take() {
                sub.unsubscribe();
            }
            Ok(())
        });
        *slot.lock() = Some(sub);

        bus.publish(started());
        bus.publish(started());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_publish_reentrantly() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));

        let inner_bus = bus.clone();
        bus.subscribe(EventKind::TaskStarted, move |_| {
            inner_bus.publish(loaded());
            Ok(())
        });
        let h = Arc::clone(&hits);
        bus.subscribe(EventKind::PluginLoaded, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = bus.publish(started());
        assert!(report.is_clean());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panic_message_extracts_text() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
