use std::sync::Arc;

use crate::services::{queue::JobQueue, session::SessionStore, store::AnalysisStore};

/// Operator credentials the login endpoint checks against.
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<JobQueue>,
    pub store: Arc<AnalysisStore>,
    pub sessions: Arc<SessionStore>,
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    pub fn new(
        queue: Arc<JobQueue>,
        store: Arc<AnalysisStore>,
        sessions: SessionStore,
        admin: AdminCredentials,
    ) -> Self {
        Self {
            queue,
            store,
            sessions: Arc::new(sessions),
            admin: Arc::new(admin),
        }
    }
}
