//! Tour repository trait for registration records.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{GuideId, Tour, TourCode};

/// Repository trait for tour operations.
///
/// Tours are looked up by their registration code, not their row ID; the
/// code is what schools quote on the phone.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TourRepository: Send + Sync {
    /// Store a tour registration.
    ///
    /// Storing is idempotent on the registration checksum: if a tour with
    /// the same checksum already exists, the stored tour is returned as-is
    /// and nothing is written.
    ///
    /// # Arguments
    /// * `tour` - The tour to store; `tour.id` is ignored
    ///
    /// # Returns
    /// * `Ok(Tour)` - The stored (or already existing) tour, ID assigned
    /// * `Err(RepositoryError)` - If the operation fails
    async fn store_tour(&self, tour: &Tour) -> RepositoryResult<Tour>;

    /// Fetch a tour by registration code.
    ///
    /// # Returns
    /// * `Ok(Tour)` - The tour
    /// * `Err(RepositoryError::NotFound)` - No tour with this code
    /// * `Err(RepositoryError)` - If the operation fails
    async fn get_tour(&self, code: &TourCode) -> RepositoryResult<Tour>;

    /// Check whether a registration code is already taken.
    ///
    /// # Returns
    /// * `Ok(bool)` - True if a tour with this code exists
    /// * `Err(RepositoryError)` - If the operation fails
    async fn tour_code_exists(&self, code: &TourCode) -> RepositoryResult<bool>;

    /// List every stored tour.
    ///
    /// # Returns
    /// * `Ok(Vec<Tour>)` - All tours, in no particular order
    /// * `Err(RepositoryError)` - If the operation fails
    async fn list_tours(&self) -> RepositoryResult<Vec<Tour>>;

    /// Assign or clear the guide on a tour.
    ///
    /// # Arguments
    /// * `code` - Registration code of the tour
    /// * `guide_id` - The guide to assign, or `None` to clear the assignment
    ///
    /// # Returns
    /// * `Ok(Tour)` - The updated tour
    /// * `Err(RepositoryError::NotFound)` - No tour with this code
    /// * `Err(RepositoryError)` - If the operation fails
    async fn assign_guide(
        &self,
        code: &TourCode,
        guide_id: Option<GuideId>,
    ) -> RepositoryResult<Tour>;
}
