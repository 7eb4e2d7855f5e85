//! Bounded-capacity time slot with a priority waitlist.
//!
//! A slot admits at most `max_admitted` tours; everything else waits. Both
//! lists are kept sorted ascending by `(priority, seq)`, so the weakest
//! admitted tour is always first and the strongest waitlisted tour is always
//! last. `seq` is a per-slot insertion counter, which makes the order stable
//! for equal priorities.
//!
//! Once a slot is full, a newcomer only displaces the weakest incumbent when
//! it beats that incumbent's priority by more than [`PRIORITY_BIAS`]. The bias
//! keeps confirmed visits from churning every time a marginally stronger
//! request arrives; a displaced tour is moved to the waitlist, never dropped.

use serde::{Deserialize, Serialize};

use crate::api::{SlotId, TourCode};
use crate::models::calendar::{CalendarError, SlotKey};

/// Hysteresis margin for displacing an admitted tour.
///
/// A newcomer must exceed the weakest incumbent's priority by more than this
/// value; ties and small gains keep the incumbent seated.
pub const PRIORITY_BIAS: i32 = 100;

/// Admitted-set capacity used when a slot is created without an explicit one.
pub const DEFAULT_SLOT_CAPACITY: usize = 3;

/// Membership precondition failures for slot operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    /// The tour already occupies a place in this slot.
    #[error("tour {code} is already present in the slot")]
    AlreadyPresent { code: TourCode },

    /// Expected the tour to be admitted and it is not.
    #[error("tour {code} is not admitted in the slot")]
    NotAdmitted { code: TourCode },

    /// Expected the tour to be waitlisted and it is not.
    #[error("tour {code} is not waitlisted in the slot")]
    NotWaitlisted { code: TourCode },
}

/// One tour's place in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    /// Registration code of the tour
    pub code: TourCode,
    /// Priority cached at registration time
    pub priority: i32,
    /// Insertion counter value, breaks ties between equal priorities
    pub seq: u64,
}

/// Result of an admission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The tour holds a seat; `displaced` names the incumbent that was moved
    /// to the waitlist to make room, if any.
    Admitted { displaced: Option<TourCode> },
    /// No seat available, the tour joined the waitlist.
    Waitlisted,
}

/// Result of removing a tour from a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The tour was not in this slot; nothing changed.
    NotPresent,
    /// The tour left the waitlist.
    RemovedFromWaitlist,
    /// The tour gave up its seat; `promoted` is the waitlisted tour that
    /// took it, if the waitlist was non-empty.
    RemovedFromAdmitted { promoted: Option<TourCode> },
}

/// Occupancy counters for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOccupancy {
    pub admitted: usize,
    pub waitlisted: usize,
}

/// A bookable visit slot.
///
/// Invariants maintained by every operation:
/// - `admitted.len() <= max_admitted`
/// - a tour code appears at most once across both lists
/// - both lists are sorted ascending by `(priority, seq)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    id: SlotId,
    max_admitted: usize,
    next_seq: u64,
    admitted: Vec<SlotEntry>,
    waitlisted: Vec<SlotEntry>,
}

impl TimeSlot {
    /// Create an empty slot with the given admitted-set capacity.
    pub fn new(id: SlotId, max_admitted: usize) -> Self {
        Self {
            id,
            max_admitted,
            next_seq: 0,
            admitted: Vec::new(),
            waitlisted: Vec::new(),
        }
    }

    /// Create an empty slot with [`DEFAULT_SLOT_CAPACITY`].
    pub fn with_default_capacity(id: SlotId) -> Self {
        Self::new(id, DEFAULT_SLOT_CAPACITY)
    }

    /// Reassemble a slot from stored fields. Callers must pass lists that
    /// were produced by this type, so the sort order is already correct.
    pub(crate) fn from_parts(
        id: SlotId,
        max_admitted: usize,
        next_seq: u64,
        admitted: Vec<SlotEntry>,
        waitlisted: Vec<SlotEntry>,
    ) -> Self {
        Self {
            id,
            max_admitted,
            next_seq,
            admitted,
            waitlisted,
        }
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn max_admitted(&self) -> usize {
        self.max_admitted
    }

    /// Calendar position of this slot.
    pub fn key(&self) -> Result<SlotKey, CalendarError> {
        SlotKey::from_slot_id(self.id)
    }

    /// Admitted tours, weakest first.
    pub fn admitted(&self) -> &[SlotEntry] {
        &self.admitted
    }

    /// Waitlisted tours, weakest first.
    pub fn waitlisted(&self) -> &[SlotEntry] {
        &self.waitlisted
    }

    pub fn occupancy(&self) -> SlotOccupancy {
        SlotOccupancy {
            admitted: self.admitted.len(),
            waitlisted: self.waitlisted.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.admitted.is_empty() && self.waitlisted.is_empty()
    }

    pub fn is_admitted(&self, code: &TourCode) -> bool {
        self.admitted.iter().any(|e| &e.code == code)
    }

    pub fn is_waitlisted(&self, code: &TourCode) -> bool {
        self.waitlisted.iter().any(|e| &e.code == code)
    }

    pub fn contains(&self, code: &TourCode) -> bool {
        self.is_admitted(code) || self.is_waitlisted(code)
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Insert keeping the ascending `(priority, seq)` order.
    ///
    /// The entry carries a fresh `seq`, so among equal priorities it lands
    /// after every entry already in the list.
    fn insert_ordered(list: &mut Vec<SlotEntry>, entry: SlotEntry) {
        let pos = list.partition_point(|e| e.priority <= entry.priority);
        list.insert(pos, entry);
    }

    /// Request admission for a tour.
    ///
    /// # Arguments
    /// * `code` - Registration code of the tour
    /// * `priority` - The tour's cached priority
    ///
    /// # Returns
    /// * `Ok(AdmissionOutcome)` - Where the tour ended up
    /// * `Err(SlotError::AlreadyPresent)` - The tour is already in the slot
    pub fn request_admission(
        &mut self,
        code: TourCode,
        priority: i32,
    ) -> Result<AdmissionOutcome, SlotError> {
        if self.contains(&code) {
            return Err(SlotError::AlreadyPresent { code });
        }

        if self.admitted.len() < self.max_admitted {
            let seq = self.take_seq();
            Self::insert_ordered(
                &mut self.admitted,
                SlotEntry {
                    code,
                    priority,
                    seq,
                },
            );
            return Ok(AdmissionOutcome::Admitted { displaced: None });
        }

        // Full slot: compare against the weakest incumbent. Widen to i64 so a
        // priority near i32::MAX cannot overflow the comparison.
        let displaces_incumbent = self
            .admitted
            .first()
            .map(|lowest| (lowest.priority as i64 + PRIORITY_BIAS as i64) < priority as i64)
            .unwrap_or(false);

        if displaces_incumbent {
            let displaced = self.admitted.remove(0);
            let displaced_code = displaced.code.clone();

            let seq = self.take_seq();
            Self::insert_ordered(
                &mut self.waitlisted,
                SlotEntry {
                    code: displaced.code,
                    priority: displaced.priority,
                    seq,
                },
            );

            let seq = self.take_seq();
            Self::insert_ordered(
                &mut self.admitted,
                SlotEntry {
                    code,
                    priority,
                    seq,
                },
            );

            Ok(AdmissionOutcome::Admitted {
                displaced: Some(displaced_code),
            })
        } else {
            let seq = self.take_seq();
            Self::insert_ordered(
                &mut self.waitlisted,
                SlotEntry {
                    code,
                    priority,
                    seq,
                },
            );
            Ok(AdmissionOutcome::Waitlisted)
        }
    }

    /// Swap an admitted tour for a waitlisted one.
    ///
    /// The admitted tour leaves the slot entirely; the waitlisted tour takes
    /// its seat. Both membership preconditions are checked before anything is
    /// mutated, so a failure leaves the slot untouched.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(SlotError::NotAdmitted)` - `admitted_code` holds no seat
    /// * `Err(SlotError::NotWaitlisted)` - `waitlisted_code` is not waiting
    pub fn replace(
        &mut self,
        admitted_code: &TourCode,
        waitlisted_code: &TourCode,
    ) -> Result<(), SlotError> {
        let admitted_pos = self
            .admitted
            .iter()
            .position(|e| &e.code == admitted_code)
            .ok_or_else(|| SlotError::NotAdmitted {
                code: admitted_code.clone(),
            })?;
        let waitlist_pos = self
            .waitlisted
            .iter()
            .position(|e| &e.code == waitlisted_code)
            .ok_or_else(|| SlotError::NotWaitlisted {
                code: waitlisted_code.clone(),
            })?;

        self.admitted.remove(admitted_pos);
        let entry = self.waitlisted.remove(waitlist_pos);

        let seq = self.take_seq();
        Self::insert_ordered(
            &mut self.admitted,
            SlotEntry {
                code: entry.code,
                priority: entry.priority,
                seq,
            },
        );

        Ok(())
    }

    /// Remove a tour from the slot.
    ///
    /// Removing an admitted tour frees a seat; the strongest waitlisted tour
    /// (most recently waitlisted among equals) is promoted into it. Removing
    /// an absent tour is a no-op reported as [`RemoveOutcome::NotPresent`].
    pub fn remove(&mut self, code: &TourCode) -> RemoveOutcome {
        if let Some(pos) = self.waitlisted.iter().position(|e| &e.code == code) {
            self.waitlisted.remove(pos);
            return RemoveOutcome::RemovedFromWaitlist;
        }

        let Some(pos) = self.admitted.iter().position(|e| &e.code == code) else {
            return RemoveOutcome::NotPresent;
        };
        self.admitted.remove(pos);

        let promoted = match self.waitlisted.pop() {
            Some(entry) => {
                let promoted_code = entry.code.clone();
                let seq = self.take_seq();
                Self::insert_ordered(
                    &mut self.admitted,
                    SlotEntry {
                        code: entry.code,
                        priority: entry.priority,
                        seq,
                    },
                );
                Some(promoted_code)
            }
            None => None,
        };

        RemoveOutcome::RemovedFromAdmitted { promoted }
    }
}
