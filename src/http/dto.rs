//! Data Transfer Objects for the HTTP API.
//!
//! These DTOs are used for request/response serialization in the REST API.
//! Domain types that already derive Serialize/Deserialize are re-exported
//! as-is; slots get a dedicated DTO so internal bookkeeping fields stay off
//! the wire.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// Re-export existing DTOs that are already serializable
pub use crate::api::{School, SlotSummary, Tour, TourCode, TourKind, TourRegistration};
pub use crate::models::slot::{AdmissionOutcome, RemoveOutcome, SlotOccupancy};
pub use crate::services::TourEvent;

use crate::models::calendar::SlotKey;
use crate::models::slot::{SlotEntry, TimeSlot};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// School list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolListResponse {
    /// List of schools
    pub schools: Vec<School>,
    /// Total count
    pub total: usize,
}

/// Tour list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourListResponse {
    /// List of tours
    pub tours: Vec<Tour>,
    /// Total count
    pub total: usize,
}

/// Request body for assigning or clearing a tour's guide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignGuideRequest {
    /// Guide to assign; null (or omitted) clears the assignment
    #[serde(default)]
    pub guide_id: Option<i64>,
}

/// Request body for creating a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    /// Day of the visit
    pub day: NaiveDate,
    /// Position within the day (0-based)
    pub slot_index: u8,
    /// Admitted capacity (default applies when omitted)
    #[serde(default)]
    pub max_admitted: Option<usize>,
}

/// Query parameters for the slot listing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SlotListQuery {
    /// Restrict the listing to one day (optional)
    #[serde(default)]
    pub day: Option<NaiveDate>,
}

/// One occupant of a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotEntryDto {
    /// Registration code of the tour
    pub tour_code: TourCode,
    /// The tour's cached priority
    pub priority: i32,
}

impl From<&SlotEntry> for SlotEntryDto {
    fn from(entry: &SlotEntry) -> Self {
        Self {
            tour_code: entry.code.clone(),
            priority: entry.priority,
        }
    }
}

/// Slot representation for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDto {
    /// Stable slot identifier
    pub slot_id: i64,
    /// Day of the visit
    pub day: NaiveDate,
    /// Position within the day (0-based)
    pub slot_index: u8,
    /// Wall-clock start of the slot
    pub starts_at: NaiveDateTime,
    /// Admitted capacity
    pub max_admitted: usize,
    /// Admitted tours, weakest first
    pub admitted: Vec<SlotEntryDto>,
    /// Waitlisted tours, weakest first
    pub waitlisted: Vec<SlotEntryDto>,
}

impl SlotDto {
    pub fn new(key: SlotKey, slot: &TimeSlot) -> Self {
        Self {
            slot_id: slot.id().value(),
            day: key.day.date(),
            slot_index: key.index.value(),
            starts_at: key.starts_at(),
            max_admitted: slot.max_admitted(),
            admitted: slot.admitted().iter().map(Into::into).collect(),
            waitlisted: slot.waitlisted().iter().map(Into::into).collect(),
        }
    }
}

/// Slot list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListResponse {
    /// Lightweight slot listing, occupant counts only
    pub slots: Vec<SlotSummary>,
    /// Total count
    pub total: usize,
}

/// Request body for an admission request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRequest {
    /// Registration code of the tour asking for a seat
    pub tour_code: TourCode,
}

/// Outcome of an admission request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionResponse {
    /// Where the tour ended up ("admitted" or "waitlisted")
    pub status: String,
    /// Incumbent pushed to the waitlist, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displaced: Option<TourCode>,
}

impl From<AdmissionOutcome> for AdmissionResponse {
    fn from(outcome: AdmissionOutcome) -> Self {
        match outcome {
            AdmissionOutcome::Admitted { displaced } => Self {
                status: "admitted".to_string(),
                displaced,
            },
            AdmissionOutcome::Waitlisted => Self {
                status: "waitlisted".to_string(),
                displaced: None,
            },
        }
    }
}

/// Outcome of removing a tour from a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalResponse {
    /// What the removal did ("not_present", "removed_from_waitlist" or
    /// "removed_from_admitted")
    pub status: String,
    /// Tour promoted into the freed seat, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<TourCode>,
}

impl From<RemoveOutcome> for RemovalResponse {
    fn from(outcome: RemoveOutcome) -> Self {
        match outcome {
            RemoveOutcome::NotPresent => Self {
                status: "not_present".to_string(),
                promoted: None,
            },
            RemoveOutcome::RemovedFromWaitlist => Self {
                status: "removed_from_waitlist".to_string(),
                promoted: None,
            },
            RemoveOutcome::RemovedFromAdmitted { promoted } => Self {
                status: "removed_from_admitted".to_string(),
                promoted,
            },
        }
    }
}

/// Request body for swapping an admitted tour with a waitlisted one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceRequest {
    /// Tour giving up its seat
    pub admitted_code: TourCode,
    /// Waitlisted tour taking the seat
    pub waitlisted_code: TourCode,
}

/// Recent admission events, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogResponse {
    /// Buffered events
    pub events: Vec<TourEvent>,
    /// Total count
    pub total: usize,
}
