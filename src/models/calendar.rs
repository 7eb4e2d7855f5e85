//! Visit calendar grid.
//!
//! The outreach office runs a fixed number of tour slots per day at fixed
//! start times. A slot is addressed either by its calendar position
//! (day + index) or by a stable numeric id derived from that position.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::SlotId;

/// Number of tour slots offered per day.
pub const SLOTS_PER_DAY: u8 = 4;

/// Daily start times as (hour, minute) pairs, one per slot index.
pub const SLOT_START_TIMES: [(u32, u32); SLOTS_PER_DAY as usize] =
    [(9, 0), (11, 0), (13, 30), (16, 0)];

/// Errors for calendar address handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// Slot index outside the daily grid.
    #[error("invalid slot index {index}, day has {SLOTS_PER_DAY} slots")]
    InvalidSlotIndex { index: u8 },

    /// Raw slot id that does not decode to a calendar position.
    #[error("invalid slot id {id}")]
    InvalidSlotId { id: i64 },
}

/// Calendar day a visit takes place on.
///
/// Always date-only: any time-of-day component is dropped on construction so
/// two timestamps on the same day address the same slots.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VisitDay(NaiveDate);

impl VisitDay {
    pub fn new(date: NaiveDate) -> Self {
        VisitDay(date)
    }

    /// Normalize a timestamp to its visit day.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        VisitDay(dt.date())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for VisitDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NaiveDate> for VisitDay {
    fn from(date: NaiveDate) -> Self {
        VisitDay(date)
    }
}

/// Position of a slot within its day (0-based).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Create a slot index, rejecting positions outside the daily grid.
    pub fn new(index: u8) -> Result<Self, CalendarError> {
        if index < SLOTS_PER_DAY {
            Ok(SlotIndex(index))
        } else {
            Err(CalendarError::InvalidSlotIndex { index })
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Start time of this slot within its day.
    pub fn start_time(&self) -> NaiveTime {
        let (hour, minute) = SLOT_START_TIMES[self.0 as usize];
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl std::fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendar address of a time slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub day: VisitDay,
    pub index: SlotIndex,
}

impl SlotKey {
    pub fn new(day: VisitDay, index: SlotIndex) -> Self {
        Self { day, index }
    }

    /// Build a key from raw parts, validating the index.
    pub fn from_parts(day: NaiveDate, index: u8) -> Result<Self, CalendarError> {
        Ok(Self {
            day: VisitDay::new(day),
            index: SlotIndex::new(index)?,
        })
    }

    /// Stable numeric id for this calendar position.
    pub fn slot_id(&self) -> SlotId {
        let day_number = self.day.date().num_days_from_ce() as i64;
        SlotId(day_number * SLOTS_PER_DAY as i64 + self.index.value() as i64)
    }

    /// Decode a raw slot id back to its calendar position.
    pub fn from_slot_id(id: SlotId) -> Result<Self, CalendarError> {
        let per_day = SLOTS_PER_DAY as i64;
        let day_number = id.value().div_euclid(per_day);
        let index = id.value().rem_euclid(per_day) as u8;

        let day_number_i32 = i32::try_from(day_number)
            .map_err(|_| CalendarError::InvalidSlotId { id: id.value() })?;
        let date = NaiveDate::from_num_days_from_ce_opt(day_number_i32)
            .ok_or(CalendarError::InvalidSlotId { id: id.value() })?;

        Ok(Self {
            day: VisitDay::new(date),
            index: SlotIndex::new(index)?,
        })
    }

    /// Wall-clock start of this slot.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.day.date().and_time(self.index.start_time())
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.day, self.index)
    }
}
