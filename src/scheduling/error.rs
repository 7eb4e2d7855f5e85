//! Error types for registry operations.

use crate::api::TourCode;
use crate::db::repository::RepositoryError;
use crate::models::calendar::{CalendarError, SlotKey};
use crate::models::slot::SlotError;

/// Result type for registry operations.
pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Errors raised while coordinating slot admission.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// Malformed calendar address.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Operation addressed a slot that was never created.
    #[error("slot {key} not found")]
    SlotNotFound { key: SlotKey },

    /// Operation referenced a tour with no registration on record.
    #[error("tour '{code}' not found")]
    TourNotFound { code: TourCode },

    /// Attempt to create a slot that already exists.
    #[error("slot {key} already exists")]
    SlotExists { key: SlotKey },

    /// Attempt to delete a slot that still holds tours.
    #[error("slot {key} still has admitted or waitlisted tours")]
    SlotNotEmpty { key: SlotKey },

    /// Membership conflict inside the slot.
    #[error(transparent)]
    Slot(#[from] SlotError),

    /// Storage backend failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
