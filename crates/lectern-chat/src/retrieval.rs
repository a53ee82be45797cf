//! Retrieval and catalog capabilities consumed by the query pipeline.

use async_trait::async_trait;

use lectern_core::types::{CourseStats, RetrievedChunk};
use lectern_vector::CourseStore;

use crate::error::ChatError;

/// Finds the course chunks most relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` chunks, most relevant first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, ChatError>;
}

/// Reports catalog statistics.
pub trait CourseAnalytics: Send + Sync {
    fn course_stats(&self) -> Result<CourseStats, ChatError>;
}

#[async_trait]
impl Retriever for CourseStore {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, ChatError> {
        self.search(query, k)
            .await
            .map_err(|e| ChatError::Retrieval(e.to_string()))
    }
}

impl CourseAnalytics for CourseStore {
    fn course_stats(&self) -> Result<CourseStats, ChatError> {
        self.stats().map_err(|e| ChatError::Analytics(e.to_string()))
    }
}
