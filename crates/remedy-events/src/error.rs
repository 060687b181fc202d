//! Event channel errors

use crate::EventKind;

/// Errors raised when decoding events from their wire form
///
/// Publishing never fails; handler failures are reported through
/// [`crate::DeliveryReport`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    /// Name outside the closed event set
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Payload does not match the shape fixed for the event
    #[error("invalid payload for {event}: {message}")]
    InvalidPayload { event: EventKind, message: String },
}
