//! Route handler functions for the Lectern API.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::Uri;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lectern_core::types::CourseStats;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Body of POST /api/query.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response of POST /api/query.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub session_id: String,
}

/// Response of GET /api/courses.
#[derive(Debug, Serialize, Deserialize)]
pub struct CourseStatsResponse {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

impl From<CourseStats> for CourseStatsResponse {
    fn from(stats: CourseStats) -> Self {
        Self {
            total_courses: stats.total_courses,
            course_titles: stats.course_titles,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/query - answer a question about the course materials.
pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload?;
    debug!(
        query_len = request.query.len(),
        has_session = request.session_id.is_some(),
        "Query received"
    );

    let result = state
        .orchestrator
        .answer(&request.query, request.session_id)
        .await?;

    Ok(Json(QueryResponse {
        answer: result.answer,
        sources: result.sources,
        session_id: result.session_id,
    }))
}

/// GET /api/courses - catalog statistics.
pub async fn courses(
    State(state): State<AppState>,
) -> Result<Json<CourseStatsResponse>, ApiError> {
    let stats = state.analytics.course_stats()?;
    Ok(Json(stats.into()))
}

/// GET / - liveness and service description.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Lectern course materials RAG API".to_string(),
    })
}

/// Fallback for paths with no route.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
