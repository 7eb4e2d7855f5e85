//! Shared data models re-exported for database layer consumers.

pub use crate::api::{
    GuideId, School, SchoolId, SlotId, Tour, TourCode, TourId, TourKind, TourRegistration,
    VisitDay,
};
pub use crate::models::slot::{SlotEntry, TimeSlot};
