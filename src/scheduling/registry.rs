//! Central coordinator for slot admission.
//!
//! The registry is the only component that mutates slot state. Every mutation
//! follows the same shape: resolve the slot id, take that slot's lock, load
//! the stored slot, apply the in-memory transition, save, and only then
//! publish notification events. Readers go straight to the repository.
//!
//! Locks are per slot, so requests against different slots never contend.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

use crate::api::{SlotId, Tour, TourCode};
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::calendar::{SlotIndex, SlotKey, VisitDay};
use crate::models::slot::{
    AdmissionOutcome, RemoveOutcome, SlotOccupancy, TimeSlot, DEFAULT_SLOT_CAPACITY,
};
use crate::services::NotificationOutbox;

use super::error::{SchedulingError, SchedulingResult};

/// Coordinates slot mutations against the repository.
///
/// Cheap to share behind an [`Arc`]; all interior state is synchronized.
pub struct ScheduleRegistry {
    repository: Arc<dyn FullRepository>,
    outbox: NotificationOutbox,
    slot_locks: Mutex<HashMap<SlotId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ScheduleRegistry {
    pub fn new(repository: Arc<dyn FullRepository>, outbox: NotificationOutbox) -> Self {
        Self {
            repository,
            outbox,
            slot_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The outbox this registry publishes admission events to.
    pub fn outbox(&self) -> &NotificationOutbox {
        &self.outbox
    }

    /// Per-slot async lock, created on first use.
    ///
    /// The map guard is released before the returned lock is awaited, so the
    /// registry never holds the sync lock across an await point. Entries
    /// outlive the slots they guard: dropping one while waiters still hold
    /// the old `Arc` would let a second critical section start on a fresh
    /// lock for the same id.
    fn lock_for(&self, id: SlotId) -> Arc<tokio::sync::Mutex<()>> {
        self.slot_locks
            .lock()
            .entry(id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn load_tour(&self, code: &TourCode) -> SchedulingResult<Tour> {
        self.repository.get_tour(code).await.map_err(|e| match e {
            RepositoryError::NotFound { .. } => SchedulingError::TourNotFound { code: code.clone() },
            other => SchedulingError::Repository(other),
        })
    }

    async fn load_slot(&self, key: SlotKey) -> SchedulingResult<TimeSlot> {
        self.repository
            .load_slot(key.slot_id())
            .await?
            .ok_or(SchedulingError::SlotNotFound { key })
    }

    /// Create a slot at the given calendar position.
    ///
    /// # Arguments
    /// * `key` - Calendar address of the slot
    /// * `max_admitted` - Admitted capacity, or `None` for the default
    ///
    /// # Returns
    /// * `Ok(TimeSlot)` - The freshly created empty slot
    /// * `Err(SchedulingError::SlotExists)` - The position is already taken
    pub async fn create_slot(
        &self,
        key: SlotKey,
        max_admitted: Option<usize>,
    ) -> SchedulingResult<TimeSlot> {
        let id = key.slot_id();
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        if self.repository.load_slot(id).await?.is_some() {
            return Err(SchedulingError::SlotExists { key });
        }

        let slot = TimeSlot::new(id, max_admitted.unwrap_or(DEFAULT_SLOT_CAPACITY));
        self.repository.save_slot(&slot).await?;
        info!("Created slot {} (capacity {})", key, slot.max_admitted());
        Ok(slot)
    }

    /// Fetch the slot at a calendar position, creating an empty one when
    /// absent.
    ///
    /// The index is validated against the daily grid, so out-of-range
    /// positions fail before anything is stored. Repeated calls address the
    /// same logical slot and never reset its contents.
    pub async fn get_or_create_slot(
        &self,
        day: VisitDay,
        index: u8,
    ) -> SchedulingResult<TimeSlot> {
        let key = SlotKey::new(day, SlotIndex::new(index)?);
        let id = key.slot_id();
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        if let Some(slot) = self.repository.load_slot(id).await? {
            return Ok(slot);
        }

        let slot = TimeSlot::new(id, DEFAULT_SLOT_CAPACITY);
        self.repository.save_slot(&slot).await?;
        debug!("Created slot {} on first use", key);
        Ok(slot)
    }

    /// Load a slot by calendar position.
    pub async fn get_slot(&self, key: SlotKey) -> SchedulingResult<TimeSlot> {
        self.load_slot(key).await
    }

    /// Load a slot by its raw id.
    pub async fn get_slot_by_id(&self, id: SlotId) -> SchedulingResult<TimeSlot> {
        match self.repository.load_slot(id).await? {
            Some(slot) => Ok(slot),
            None => Err(SchedulingError::SlotNotFound {
                key: SlotKey::from_slot_id(id)?,
            }),
        }
    }

    /// All stored slots, optionally restricted to one day, ordered by id.
    pub async fn list_slots(&self, day: Option<VisitDay>) -> SchedulingResult<Vec<TimeSlot>> {
        let mut slots = self.repository.list_slots().await?;
        if let Some(day) = day {
            slots.retain(|slot| matches!(slot.key(), Ok(key) if key.day == day));
        }
        slots.sort_by_key(|slot| slot.id());
        Ok(slots)
    }

    /// Delete an empty slot.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(SchedulingError::SlotNotFound)` - No slot at this position
    /// * `Err(SchedulingError::SlotNotEmpty)` - Tours still present
    pub async fn remove_slot(&self, key: SlotKey) -> SchedulingResult<()> {
        let id = key.slot_id();
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let slot = self.load_slot(key).await?;
        if !slot.is_empty() {
            return Err(SchedulingError::SlotNotEmpty { key });
        }

        self.repository.delete_slot(id).await?;
        info!("Removed slot {}", key);
        Ok(())
    }

    /// Request admission of a registered tour into a slot.
    ///
    /// The slot is created on demand with the default capacity, so callers
    /// can book against any calendar position without setup. The tour's
    /// cached priority decides the outcome; see [`TimeSlot::request_admission`].
    ///
    /// A displaced incumbent gets a cancellation event and the new tour an
    /// acceptance event, both published only after the slot was saved.
    pub async fn request_admission(
        &self,
        key: SlotKey,
        code: &TourCode,
    ) -> SchedulingResult<AdmissionOutcome> {
        let tour = self.load_tour(code).await?;

        let id = key.slot_id();
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut slot = match self.repository.load_slot(id).await? {
            Some(slot) => slot,
            None => TimeSlot::new(id, DEFAULT_SLOT_CAPACITY),
        };

        let outcome = slot.request_admission(tour.code.clone(), tour.priority)?;
        self.repository.save_slot(&slot).await?;

        match &outcome {
            AdmissionOutcome::Admitted { displaced } => {
                if let Some(displaced) = displaced {
                    info!(
                        "Slot {}: tour '{}' displaced '{}' to the waitlist",
                        key, code, displaced
                    );
                    self.outbox.cancelled(displaced.clone(), id);
                } else {
                    debug!("Slot {}: admitted tour '{}'", key, code);
                }
                self.outbox.accepted(code.clone(), id);
            }
            AdmissionOutcome::Waitlisted => {
                debug!("Slot {}: waitlisted tour '{}'", key, code);
            }
        }

        Ok(outcome)
    }

    /// Remove a tour from a slot.
    ///
    /// Removing an admitted tour promotes the strongest waitlisted tour, which
    /// gets an acceptance event. Removing a tour that is not in the slot is
    /// reported as [`RemoveOutcome::NotPresent`] without touching storage.
    pub async fn remove_tour(
        &self,
        key: SlotKey,
        code: &TourCode,
    ) -> SchedulingResult<RemoveOutcome> {
        let id = key.slot_id();
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut slot = self.load_slot(key).await?;
        let outcome = slot.remove(code);
        if matches!(outcome, RemoveOutcome::NotPresent) {
            return Ok(outcome);
        }

        self.repository.save_slot(&slot).await?;

        if let RemoveOutcome::RemovedFromAdmitted {
            promoted: Some(promoted),
        } = &outcome
        {
            info!(
                "Slot {}: tour '{}' left, promoted '{}' from the waitlist",
                key, code, promoted
            );
            self.outbox.accepted(promoted.clone(), id);
        } else {
            debug!("Slot {}: removed tour '{}'", key, code);
        }

        Ok(outcome)
    }

    /// Swap an admitted tour for a waitlisted one.
    ///
    /// The outgoing tour gets a cancellation event and the incoming one an
    /// acceptance event.
    pub async fn replace_tour(
        &self,
        key: SlotKey,
        admitted: &TourCode,
        waitlisted: &TourCode,
    ) -> SchedulingResult<()> {
        let id = key.slot_id();
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut slot = self.load_slot(key).await?;
        slot.replace(admitted, waitlisted)?;
        self.repository.save_slot(&slot).await?;

        info!(
            "Slot {}: replaced admitted '{}' with waitlisted '{}'",
            key, admitted, waitlisted
        );
        self.outbox.cancelled(admitted.clone(), id);
        self.outbox.accepted(waitlisted.clone(), id);
        Ok(())
    }

    /// Occupancy counts for a slot.
    pub async fn occupancy(&self, key: SlotKey) -> SchedulingResult<SlotOccupancy> {
        Ok(self.load_slot(key).await?.occupancy())
    }
}
