//! Application services.
//!
//! Cross-cutting pieces that sit between the HTTP layer and the domain:
//! the notification outbox that records slot decisions and the ports that
//! deliver them to interested parties.

pub mod events;
pub mod notifier;

pub use events::{NotificationOutbox, TourEvent, TourEventKind};
pub use notifier::{spawn_notifier, LogNotifier, NotificationPort};
