//! Application state shared across all route handlers.

use std::sync::Arc;

use lectern_chat::{CourseAnalytics, QueryOrchestrator};

/// Shared application state, passed to handlers via axum's State extractor.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Answers queries end to end.
    pub orchestrator: Arc<QueryOrchestrator>,
    /// Course catalog statistics.
    pub analytics: Arc<dyn CourseAnalytics>,
}

impl AppState {
    pub fn new(orchestrator: QueryOrchestrator, analytics: Arc<dyn CourseAnalytics>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            analytics,
        }
    }
}
