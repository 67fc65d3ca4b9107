//! Shared domain model for the notification gateway.
//!
//! This crate holds the value types that cross crate boundaries: the
//! notification event consumed from the bus, the resolved customer profile,
//! and the per-attempt delivery result.

pub mod delivery;
pub mod event;
pub mod profile;

pub use delivery::{DeliveryResult, DeliveryStatus};
pub use event::{Channel, EventDecodeError, NotificationEvent, NotificationType, Severity};
pub use profile::CustomerProfile;
