//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::HealthCheck;
use crate::services::ReportingFacade;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub facade: ReportingFacade,
    /// Store probed by `/health`.
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new(facade: ReportingFacade, health: Arc<dyn HealthCheck>) -> Self {
        Self { facade, health }
    }
}
