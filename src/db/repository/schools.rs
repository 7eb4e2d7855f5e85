//! School repository trait for registered school records.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{School, SchoolId};

/// Repository trait for school operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait SchoolRepository: Send + Sync {
    /// Store a school record.
    ///
    /// # Arguments
    /// * `school` - The school to store; `school.id` is ignored
    ///
    /// # Returns
    /// * `Ok(SchoolId)` - ID assigned to the stored school
    /// * `Err(RepositoryError)` - If the operation fails
    async fn store_school(&self, school: &School) -> RepositoryResult<SchoolId>;

    /// Fetch a school by ID.
    ///
    /// # Returns
    /// * `Ok(School)` - The school
    /// * `Err(RepositoryError::NotFound)` - No school with this ID
    /// * `Err(RepositoryError)` - If the operation fails
    async fn get_school(&self, id: SchoolId) -> RepositoryResult<School>;

    /// List every stored school.
    ///
    /// # Returns
    /// * `Ok(Vec<School>)` - All schools, in no particular order
    /// * `Err(RepositoryError)` - If the operation fails
    async fn list_schools(&self) -> RepositoryResult<Vec<School>>;
}
