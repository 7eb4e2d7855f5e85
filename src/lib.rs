//! # TourDesk Backend
//!
//! Back office engine for university campus visit scheduling.
//!
//! This crate powers the outreach office's tour booking workflow: schools and
//! individual visitors register tours, tours are scored by priority, and the
//! scheduler admits them into bounded-capacity time slots with a waitlist and
//! hysteresis-based eviction. The backend exposes a REST API via Axum.
//!
//! ## Features
//!
//! - **Tour Intake**: Register schools and tours, issue registration codes,
//!   compute priorities once at registration time
//! - **Slot Scheduling**: Bounded-capacity admission with priority-ordered
//!   waitlists, eviction hysteresis, and promotion on withdrawal
//! - **Calendar**: Fixed daily grid of visit slots with stable slot identifiers
//! - **Notifications**: Acceptance/cancellation events published to an
//!   in-memory outbox for delivery adapters
//! - **HTTP API**: RESTful endpoints for the front office tooling
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Identifier newtypes and core data types shared across layers
//! - [`models`]: Pure domain logic (calendar grid, priority scoring, the
//!   time-slot state machine, registration codes)
//! - [`db`]: Database operations, repository pattern, and persistence layer
//! - [`scheduling`]: The schedule registry orchestrating slot mutations
//! - [`services`]: Domain events and notification dispatch
//! - [`http`]: Axum-based HTTP server and request handlers
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod models;

pub mod scheduling;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
