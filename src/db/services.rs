//! High-level database service layer.
//!
//! This module provides repository-agnostic database operations that work with
//! any implementation of the repository traits. These functions contain
//! business logic such as registration validation, priority scoring and code
//! issuance that should be consistent regardless of the storage backend.
//!
//! # Usage
//!
//! ```no_run
//! use tourdesk::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create local repository
//!     let repo = LocalRepository::new();
//!
//!     // Use service layer functions
//!     let tours = services::list_tours(&repo).await?;
//!     println!("Found {} tours", tours.len());
//!
//!     Ok(())
//! }
//! ```

use log::{info, warn};

use super::checksum::registration_checksum;
use super::models::{GuideId, School, SchoolId, Tour, TourCode, TourKind, TourRegistration};
use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::codes::CodeIssuer;
use crate::models::priority::school_priority;

/// How many fresh codes to try before giving up on a registration.
///
/// Collisions only happen when a previously issued code was stored by a
/// concurrent registration, so a handful of retries is plenty.
const MAX_CODE_ATTEMPTS: u32 = 5;

// ==================== Health & Connection ====================

/// Check if the database connection is healthy.
///
/// This is a simple pass-through to the repository's health check.
///
/// # Arguments
/// * `repo` - Repository implementation
///
/// # Returns
/// * `Ok(true)` if connection is healthy
/// * `Err` if check fails
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== School Operations ====================

/// Register a school with validation.
///
/// Schools are inert records: registering one never changes the priority of
/// tours that were scored before it existed.
///
/// # Arguments
/// * `repo` - Repository implementation
/// * `school` - The school to store (any `id` on the input is ignored)
///
/// # Returns
/// * `Ok(School)` - The stored school with its assigned ID
/// * `Err` if validation or storage fails
pub async fn register_school<R: FullRepository + ?Sized>(
    repo: &R,
    school: &School,
) -> RepositoryResult<School> {
    if school.name.trim().is_empty() {
        return Err(RepositoryError::validation_with_context(
            "School name must not be empty",
            ErrorContext::new("register_school").with_entity("school"),
        ));
    }
    if school.city.trim().is_empty() {
        return Err(RepositoryError::validation_with_context(
            "School city must not be empty",
            ErrorContext::new("register_school").with_entity("school"),
        ));
    }

    info!(
        "Service layer: registering school '{}' ({})",
        school.name, school.city
    );
    let id = repo.store_school(school).await?;

    let mut stored = school.clone();
    stored.id = Some(id);
    Ok(stored)
}

/// Retrieve a school by ID.
///
/// # Arguments
/// * `repo` - Repository implementation
/// * `id` - The ID of the school
///
/// # Returns
/// * `Ok(School)` - The school record
/// * `Err` if the school is not found or the query fails
pub async fn get_school<R: FullRepository + ?Sized>(
    repo: &R,
    id: SchoolId,
) -> RepositoryResult<School> {
    repo.get_school(id).await
}

/// List all schools on record.
///
/// # Arguments
/// * `repo` - Repository implementation
///
/// # Returns
/// * `Ok(Vec<School>)` - All registered schools
/// * `Err` if the query fails
pub async fn list_schools<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<School>> {
    repo.list_schools().await
}

// ==================== Tour Operations ====================

/// Register a tour with full business logic.
///
/// This function orchestrates the complete tour intake process:
/// 1. Validate the registration against its kind (school tours need a school
///    on record, walk-in tours need a city of origin)
/// 2. Score the tour: school tours get the weighted school priority, all
///    other kinds get priority 0
/// 3. Issue a registration code, retrying on collision with already stored
///    codes
/// 4. Store the tour; if the same registration payload was stored before, the
///    original record is returned unchanged (checksum deduplication)
///
/// # Arguments
/// * `repo` - Repository implementation
/// * `issuer` - Code issuer used to mint registration codes
/// * `registration` - The registration payload
///
/// # Returns
/// * `Ok(Tour)` - The stored tour (new or existing), ID and code assigned
/// * `Err` if validation, code issuance or storage fails
pub async fn register_tour<R: FullRepository + ?Sized>(
    repo: &R,
    issuer: &dyn CodeIssuer,
    registration: &TourRegistration,
) -> RepositoryResult<Tour> {
    let (school_id, city, priority) = match registration.kind {
        TourKind::School => {
            let school_id = registration.school_id.ok_or_else(|| {
                RepositoryError::validation_with_context(
                    "School tours must reference a school on record",
                    ErrorContext::new("register_tour").with_entity("tour"),
                )
            })?;
            let school = repo.get_school(school_id).await?;
            let city = registration
                .city
                .clone()
                .unwrap_or_else(|| school.city.clone());
            (Some(school_id), city, school_priority(&school))
        }
        TourKind::Individual | TourKind::Fair => {
            let city = registration.city.clone().filter(|c| !c.trim().is_empty());
            let city = city.ok_or_else(|| {
                RepositoryError::validation_with_context(
                    "Individual and fair tours must carry a city of origin",
                    ErrorContext::new("register_tour").with_entity("tour"),
                )
            })?;
            (None, city, 0)
        }
    };

    let checksum = registration_checksum(registration)?;

    let mut code = issuer.issue(&city);
    let mut attempts = 1;
    while repo.tour_code_exists(&code).await? {
        if attempts >= MAX_CODE_ATTEMPTS {
            return Err(RepositoryError::internal_with_context(
                "Could not issue a unique tour code",
                ErrorContext::new("register_tour")
                    .with_entity("tour")
                    .with_details(format!("{} attempts exhausted", MAX_CODE_ATTEMPTS)),
            ));
        }
        warn!(
            "Service layer: tour code '{}' already taken, reissuing (attempt {}/{})",
            code, attempts, MAX_CODE_ATTEMPTS
        );
        code = issuer.issue(&city);
        attempts += 1;
    }

    info!(
        "Service layer: registering {} tour '{}' (priority {}, checksum {})",
        registration.kind, code, priority, checksum
    );

    let tour = Tour {
        id: None,
        code,
        kind: registration.kind,
        school_id,
        city,
        priority,
        guide_id: None,
        checksum,
        registered_at: chrono::Utc::now(),
    };

    let stored = repo.store_tour(&tour).await?;
    if stored.code != tour.code {
        info!(
            "Service layer: registration already on record, returning existing tour '{}'",
            stored.code
        );
    }
    Ok(stored)
}

/// Retrieve a tour by its registration code.
///
/// # Arguments
/// * `repo` - Repository implementation
/// * `code` - The registration code
///
/// # Returns
/// * `Ok(Tour)` - The tour record
/// * `Err` if the tour is not found or the query fails
pub async fn get_tour<R: FullRepository + ?Sized>(
    repo: &R,
    code: &TourCode,
) -> RepositoryResult<Tour> {
    repo.get_tour(code).await
}

/// List all registered tours.
///
/// # Arguments
/// * `repo` - Repository implementation
///
/// # Returns
/// * `Ok(Vec<Tour>)` - All registered tours
/// * `Err` if the query fails
pub async fn list_tours<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Tour>> {
    repo.list_tours().await
}

/// Assign or clear the guide on a tour.
///
/// Guide assignment is bookkeeping on the tour record. It never affects slot
/// admission or ordering.
///
/// # Arguments
/// * `repo` - Repository implementation
/// * `code` - The registration code of the tour
/// * `guide_id` - The guide to assign, or `None` to clear the assignment
///
/// # Returns
/// * `Ok(Tour)` - The updated tour record
/// * `Err` if the tour is not found or the update fails
pub async fn assign_guide<R: FullRepository + ?Sized>(
    repo: &R,
    code: &TourCode,
    guide_id: Option<GuideId>,
) -> RepositoryResult<Tour> {
    match guide_id {
        Some(guide) => info!("Service layer: assigning guide {} to tour '{}'", guide, code),
        None => info!("Service layer: clearing guide on tour '{}'", code),
    }
    repo.assign_guide(code, guide_id).await
}
