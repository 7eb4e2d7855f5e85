//! In-memory repository backend.
//!
//! The default backend for development and tests. All state lives behind
//! `parking_lot` locks inside a shared `Arc`, so cloned handles observe the
//! same data. Nothing survives a restart.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use crate::api::{GuideId, School, SchoolId, SlotId, Tour, TourCode, TourId};
use crate::db::repository::{
    ErrorContext, RepositoryError, RepositoryResult, SchoolRepository, SlotRepository,
    TourRepository,
};
use crate::models::TimeSlot;

struct LocalState {
    slots: RwLock<HashMap<i64, TimeSlot>>,
    tours: RwLock<HashMap<String, Tour>>,
    schools: RwLock<HashMap<i64, School>>,
    next_tour_id: AtomicI64,
    next_school_id: AtomicI64,
    healthy: AtomicBool,
}

/// In-memory implementation of the repository traits.
///
/// Cloning is cheap; clones share the underlying state.
#[derive(Clone)]
pub struct LocalRepository {
    state: Arc<LocalState>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(LocalState {
                slots: RwLock::new(HashMap::new()),
                tours: RwLock::new(HashMap::new()),
                schools: RwLock::new(HashMap::new()),
                next_tour_id: AtomicI64::new(1),
                next_school_id: AtomicI64::new(1),
                healthy: AtomicBool::new(true),
            }),
        }
    }

    /// Simulate backend unavailability; every operation fails while false.
    ///
    /// Test hook for exercising error paths.
    pub fn set_healthy(&self, healthy: bool) {
        self.state.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Drop all stored data. ID counters keep running.
    pub fn clear(&self) {
        self.state.slots.write().clear();
        self.state.tours.write().clear();
        self.state.schools.write().clear();
    }

    pub fn slot_count(&self) -> usize {
        self.state.slots.read().len()
    }

    pub fn tour_count(&self) -> usize {
        self.state.tours.read().len()
    }

    pub fn school_count(&self) -> usize {
        self.state.schools.read().len()
    }

    pub fn has_slot(&self, id: SlotId) -> bool {
        self.state.slots.read().contains_key(&id.value())
    }

    pub fn has_tour(&self, code: &TourCode) -> bool {
        self.state.tours.read().contains_key(code.as_str())
    }

    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.state.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RepositoryError::connection_with_context(
                "local repository marked unhealthy",
                ErrorContext::new(operation),
            ))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlotRepository for LocalRepository {
    async fn save_slot(&self, slot: &TimeSlot) -> RepositoryResult<()> {
        self.ensure_healthy("save_slot")?;
        self.state.slots.write().insert(slot.id().value(), slot.clone());
        Ok(())
    }

    async fn load_slot(&self, id: SlotId) -> RepositoryResult<Option<TimeSlot>> {
        self.ensure_healthy("load_slot")?;
        Ok(self.state.slots.read().get(&id.value()).cloned())
    }

    async fn delete_slot(&self, id: SlotId) -> RepositoryResult<bool> {
        self.ensure_healthy("delete_slot")?;
        Ok(self.state.slots.write().remove(&id.value()).is_some())
    }

    async fn list_slots(&self) -> RepositoryResult<Vec<TimeSlot>> {
        self.ensure_healthy("list_slots")?;
        Ok(self.state.slots.read().values().cloned().collect())
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.ensure_healthy("health_check")?;
        Ok(true)
    }
}

#[async_trait]
impl TourRepository for LocalRepository {
    async fn store_tour(&self, tour: &Tour) -> RepositoryResult<Tour> {
        self.ensure_healthy("store_tour")?;

        if tour.code.as_str().is_empty() {
            return Err(RepositoryError::validation_with_context(
                "tour code must not be empty",
                ErrorContext::new("store_tour").with_entity("tour"),
            ));
        }

        let mut tours = self.state.tours.write();

        // Same checksum means the same registration replayed; report the
        // stored row instead of writing a duplicate.
        if !tour.checksum.is_empty() {
            if let Some(existing) = tours.values().find(|t| t.checksum == tour.checksum) {
                return Ok(existing.clone());
            }
        }

        if tours.contains_key(tour.code.as_str()) {
            return Err(RepositoryError::validation_with_context(
                format!("tour code {} already taken", tour.code),
                ErrorContext::new("store_tour")
                    .with_entity("tour")
                    .with_entity_id(tour.code.clone()),
            ));
        }

        let id = TourId::new(self.state.next_tour_id.fetch_add(1, Ordering::SeqCst));
        let mut stored = tour.clone();
        stored.id = Some(id);
        tours.insert(stored.code.as_str().to_string(), stored.clone());
        Ok(stored)
    }

    async fn get_tour(&self, code: &TourCode) -> RepositoryResult<Tour> {
        self.ensure_healthy("get_tour")?;
        self.state
            .tours
            .read()
            .get(code.as_str())
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("tour {} not found", code),
                    ErrorContext::new("get_tour")
                        .with_entity("tour")
                        .with_entity_id(code.clone()),
                )
            })
    }

    async fn tour_code_exists(&self, code: &TourCode) -> RepositoryResult<bool> {
        self.ensure_healthy("tour_code_exists")?;
        Ok(self.state.tours.read().contains_key(code.as_str()))
    }

    async fn list_tours(&self) -> RepositoryResult<Vec<Tour>> {
        self.ensure_healthy("list_tours")?;
        Ok(self.state.tours.read().values().cloned().collect())
    }

    async fn assign_guide(
        &self,
        code: &TourCode,
        guide_id: Option<GuideId>,
    ) -> RepositoryResult<Tour> {
        self.ensure_healthy("assign_guide")?;
        let mut tours = self.state.tours.write();
        let tour = tours.get_mut(code.as_str()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("tour {} not found", code),
                ErrorContext::new("assign_guide")
                    .with_entity("tour")
                    .with_entity_id(code.clone()),
            )
        })?;
        tour.guide_id = guide_id;
        Ok(tour.clone())
    }
}

#[async_trait]
impl SchoolRepository for LocalRepository {
    async fn store_school(&self, school: &School) -> RepositoryResult<SchoolId> {
        self.ensure_healthy("store_school")?;
        let id = SchoolId::new(self.state.next_school_id.fetch_add(1, Ordering::SeqCst));
        let mut stored = school.clone();
        stored.id = Some(id);
        self.state.schools.write().insert(id.value(), stored);
        Ok(id)
    }

    async fn get_school(&self, id: SchoolId) -> RepositoryResult<School> {
        self.ensure_healthy("get_school")?;
        self.state
            .schools
            .read()
            .get(&id.value())
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("school {} not found", id),
                    ErrorContext::new("get_school")
                        .with_entity("school")
                        .with_entity_id(id),
                )
            })
    }

    async fn list_schools(&self) -> RepositoryResult<Vec<School>> {
        self.ensure_healthy("list_schools")?;
        Ok(self.state.schools.read().values().cloned().collect())
    }
}
