//! Slot repository trait for time-slot persistence.
//!
//! Slots are the unit of consistency for admission decisions: a slot is
//! loaded, mutated in memory, and saved back whole. Backends only need to
//! store and return the serialized occupant lists faithfully.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::SlotId;
use crate::models::TimeSlot;

/// Repository trait for slot operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Persist a slot, replacing any stored slot with the same ID.
    ///
    /// # Arguments
    /// * `slot` - The slot to store, occupant lists included
    ///
    /// # Returns
    /// * `Ok(())` - The slot was stored
    /// * `Err(RepositoryError)` - If the operation fails
    async fn save_slot(&self, slot: &TimeSlot) -> RepositoryResult<()>;

    /// Load a slot by ID.
    ///
    /// # Arguments
    /// * `id` - Calendar-derived slot ID
    ///
    /// # Returns
    /// * `Ok(Some(TimeSlot))` - The stored slot
    /// * `Ok(None)` - No slot with this ID exists
    /// * `Err(RepositoryError)` - If the operation fails
    async fn load_slot(&self, id: SlotId) -> RepositoryResult<Option<TimeSlot>>;

    /// Delete a slot by ID.
    ///
    /// # Returns
    /// * `Ok(true)` - The slot existed and was deleted
    /// * `Ok(false)` - No slot with this ID exists
    /// * `Err(RepositoryError)` - If the operation fails
    async fn delete_slot(&self, id: SlotId) -> RepositoryResult<bool>;

    /// List every stored slot.
    ///
    /// # Returns
    /// * `Ok(Vec<TimeSlot>)` - All slots, in no particular order
    /// * `Err(RepositoryError)` - If the operation fails
    async fn list_slots(&self) -> RepositoryResult<Vec<TimeSlot>>;

    /// Cheap connectivity check.
    ///
    /// # Returns
    /// * `Ok(true)` - The backend is reachable and accepting operations
    /// * `Err(RepositoryError)` - If the backend is unavailable
    async fn health_check(&self) -> RepositoryResult<bool>;
}
