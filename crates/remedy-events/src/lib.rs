//! Remedy Events - typed lifecycle event channel
//!
//! Every component communicates through an [`EventBus`] carrying a closed
//! set of [`Event`]s. Each event name has one fixed payload struct, so a
//! subscriber for `task.failed` always receives a [`event::TaskFailed`].
//!
//! # Example
//!
//! ```rust
//! use remedy_events::{Event, EventBus, EventKind};
//! use remedy_events::event::TaskStarted;
//!
//! let bus = EventBus::new();
//! let sub = bus.subscribe(EventKind::TaskStarted, |event| {
//!     println!("{}", event.to_wire());
//!     Ok(())
//! });
//!
//! let report = bus.publish(Event::TaskStarted(TaskStarted {
//!     task_id: "T1".into(),
//!     file: "a.txt".into(),
//! }));
//! assert_eq!(report.delivered, 1);
//! assert!(sub.unsubscribe());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod bus;
pub mod error;
pub mod event;
pub mod kind;

pub use bus::{
    panic_message, DeliveryFailure, DeliveryReport, EventBus, Handler, Subscription,
    SubscriptionId,
};
pub use error::EventError;
pub use event::Event;
pub use kind::EventKind;
