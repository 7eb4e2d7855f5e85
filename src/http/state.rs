//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::models::codes::{CodeIssuer, SequenceCodeIssuer};
use crate::scheduling::ScheduleRegistry;
use crate::services::NotificationOutbox;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Registry coordinating slot mutations
    pub registry: Arc<ScheduleRegistry>,
    /// Outbox the registry publishes admission events to
    pub outbox: NotificationOutbox,
    /// Issuer for tour registration codes
    pub code_issuer: Arc<dyn CodeIssuer>,
}

impl AppState {
    /// Create a new application state with the given repository.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        let outbox = NotificationOutbox::new();
        let registry = Arc::new(ScheduleRegistry::new(repository.clone(), outbox.clone()));
        Self {
            repository,
            registry,
            outbox,
            code_issuer: Arc::new(SequenceCodeIssuer::new()),
        }
    }
}
