//! Public API surface for the TourDesk backend.
//!
//! This file consolidates the identifier newtypes and core data types shared
//! by the service layer, repositories and the HTTP API.
//! All types derive Serialize/Deserialize for JSON serialization.

use serde::{Deserialize, Serialize};

pub use crate::models::calendar::{SlotIndex, SlotKey, VisitDay};

/// School identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SchoolId(pub i64);

/// Tour identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TourId(pub i64);

/// Guide identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuideId(pub i64);

/// Time slot identifier.
///
/// Derived from the calendar position: `days_from_ce * SLOTS_PER_DAY + index`,
/// so the same (day, index) pair always maps to the same id.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SlotId(pub i64);

impl SchoolId {
    pub fn new(value: i64) -> Self {
        SchoolId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TourId {
    pub fn new(value: i64) -> Self {
        TourId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl GuideId {
    pub fn new(value: i64) -> Self {
        GuideId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl SlotId {
    pub fn new(value: i64) -> Self {
        SlotId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for SchoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for TourId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for GuideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SlotId> for i64 {
    fn from(id: SlotId) -> Self {
        id.0
    }
}

/// Registration code identifying a tour (e.g. `Ankara0042`).
///
/// Codes are issued at registration time and are the public identity of a
/// tour; the numeric [`TourId`] is an internal surrogate key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TourCode(String);

impl TourCode {
    pub fn new(value: impl Into<String>) -> Self {
        TourCode(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TourCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TourCode {
    fn from(value: &str) -> Self {
        TourCode(value.to_string())
    }
}

impl From<String> for TourCode {
    fn from(value: String) -> Self {
        TourCode(value)
    }
}

/// Kind of campus visit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TourKind {
    /// Group visit organized by a high school
    School,
    /// Individual visitor or family
    Individual,
    /// University fair delegation
    Fair,
}

impl std::fmt::Display for TourKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TourKind::School => "school",
            TourKind::Individual => "individual",
            TourKind::Fair => "fair",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TourKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "school" => Ok(TourKind::School),
            "individual" => Ok(TourKind::Individual),
            "fair" => Ok(TourKind::Fair),
            other => Err(format!("Unknown tour kind: {}", other)),
        }
    }
}

/// High school on record with the outreach office.
///
/// Schools are inert priority inputs: their scores feed the priority
/// computation at tour registration time but changing them never reshuffles
/// already registered tours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct School {
    /// Database ID (optional on input, server-assigned)
    #[serde(default)]
    pub id: Option<SchoolId>,
    /// School name
    pub name: String,
    /// City the school is located in
    pub city: String,
    /// How consistently the school has sent visitors in past seasons
    pub persistence_score: i32,
    /// Academic quality score of the school
    pub quality_score: i32,
    /// Distance from campus in kilometers
    pub city_distance_km: i32,
}

impl School {
    pub fn new(
        name: impl Into<String>,
        city: impl Into<String>,
        persistence_score: i32,
        quality_score: i32,
        city_distance_km: i32,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            city: city.into(),
            persistence_score,
            quality_score,
            city_distance_km,
        }
    }
}

/// A registered campus tour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tour {
    /// Database ID (optional on input, server-assigned)
    #[serde(default)]
    pub id: Option<TourId>,
    /// Registration code (public identity)
    pub code: TourCode,
    /// Kind of visit
    pub kind: TourKind,
    /// Originating school, if this is a school tour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<SchoolId>,
    /// City of origin (used for the registration code prefix)
    pub city: String,
    /// Priority computed once at registration and cached for the tour's lifetime
    pub priority: i32,
    /// Assigned guide, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guide_id: Option<GuideId>,
    /// SHA-256 checksum of the registration payload
    #[serde(default)]
    pub checksum: String,
    /// When the tour was registered
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

/// Tour registration payload.
///
/// This is what the intake flow validates and scores before a [`Tour`] record
/// is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourRegistration {
    /// Kind of visit
    pub kind: TourKind,
    /// School on record (required for school tours)
    #[serde(default)]
    pub school_id: Option<SchoolId>,
    /// City of origin (required when no school is given)
    #[serde(default)]
    pub city: Option<String>,
}

/// Lightweight slot listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSummary {
    /// Slot identifier
    pub slot_id: SlotId,
    /// Day of the visit
    pub day: VisitDay,
    /// Position within the day
    pub slot_index: u8,
    /// Capacity of the admitted set
    pub max_admitted: usize,
    /// Number of admitted tours
    pub admitted: usize,
    /// Number of waitlisted tours
    pub waitlisted: usize,
}
