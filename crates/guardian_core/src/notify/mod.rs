//! Domain events and their notification fan-out.
//!
//! # Responsibility
//! - Define the events emitted by committed workflow transitions.
//! - Reduce each event to a deduplicated recipient set and persist one
//!   notification per recipient.
//!
//! # Invariants
//! - Publishing happens only after the triggering write has committed.
//! - Dispatch never fails the caller; problems are returned in a
//!   `DispatchReport` and logged at `warn`.

pub mod dispatcher;
pub mod event;

pub use dispatcher::{
    DeliveredNotification, DispatchReport, EventSink, NotificationDispatchError,
    NotificationDispatcher,
};
pub use event::DomainEvent;
