//! Repository traits and error types.
//!
//! Persistence is split into one trait per entity so backends and fakes can
//! implement exactly what a caller needs. [`FullRepository`] bundles them
//! for the application wiring, which holds a single `Arc<dyn FullRepository>`.

pub mod error;
pub mod schools;
pub mod slots;
pub mod tours;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use schools::SchoolRepository;
pub use slots::SlotRepository;
pub use tours::TourRepository;

/// A backend implementing every repository concern.
///
/// Blanket-implemented, so backends only implement the entity traits.
pub trait FullRepository: SlotRepository + TourRepository + SchoolRepository {}

impl<T> FullRepository for T where T: SlotRepository + TourRepository + SchoolRepository {}
