//! Slot admission orchestration.
//!
//! This module owns the write path for time slots. The [`ScheduleRegistry`]
//! serializes mutations per slot, persists them through the repository layer,
//! and publishes the resulting admission events.

pub mod error;
pub mod registry;

pub use error::{SchedulingError, SchedulingResult};
pub use registry::ScheduleRegistry;
