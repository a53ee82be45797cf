//! Course vector store: embeds course chunks, indexes them and answers
//! similarity queries.
//!
//! CourseStore combines an embedding service (boxed for dynamic dispatch)
//! with a [`VectorIndex`] and keeps the catalog of ingested course titles.

use std::path::Path;
use std::sync::RwLock;

use tracing::{debug, info};
use uuid::Uuid;

use lectern_core::error::LecternError;
use lectern_core::types::{CourseDocument, CourseStats, RetrievedChunk};

use crate::document::DocumentProcessor;
use crate::embedding::{DynEmbeddingService, EmbeddingService};
use crate::index::VectorIndex;

/// In-memory course store.
pub struct CourseStore {
    index: VectorIndex,
    embedder: Box<dyn DynEmbeddingService>,
    /// Course titles in ingestion order.
    titles: RwLock<Vec<String>>,
}

impl CourseStore {
    /// Create an empty store with the given embedding service.
    pub fn new(embedder: impl EmbeddingService + 'static) -> Self {
        Self::new_dyn(Box::new(embedder))
    }

    /// Create an empty store from a pre-boxed dynamic embedding service.
    pub fn new_dyn(embedder: Box<dyn DynEmbeddingService>) -> Self {
        Self {
            index: VectorIndex::new(),
            embedder,
            titles: RwLock::new(Vec::new()),
        }
    }

    /// Embed and index every chunk of a course.
    ///
    /// Returns the number of chunks added, or `None` if a course with the
    /// same title is already present. A course with no chunks still
    /// registers its title and yields `Some(0)`.
    pub async fn add_course(
        &self,
        document: CourseDocument,
    ) -> Result<Option<usize>, LecternError> {
        if self.has_course(&document.title)? {
            debug!(title = %document.title, "Course already indexed, skipping");
            return Ok(None);
        }

        let mut vectors = Vec::with_capacity(document.chunks.len());
        for chunk in &document.chunks {
            let embedding = self.embedder.embed_boxed(&chunk.content).await?;
            vectors.push(embedding);
        }

        let mut titles = self
            .titles
            .write()
            .map_err(|e| LecternError::Storage(format!("Lock poisoned: {}", e)))?;
        // Another task may have added the same course while we were embedding.
        if titles.iter().any(|t| t == &document.title) {
            return Ok(None);
        }

        let added = document.chunks.len();
        for (chunk, embedding) in document.chunks.into_iter().zip(vectors) {
            self.index.insert(Uuid::new_v4(), embedding, chunk)?;
        }
        titles.push(document.title.clone());

        info!(title = %document.title, chunks = added, "Course indexed");
        Ok(Some(added))
    }

    /// Parse and index every course file in `folder`.
    ///
    /// Returns `(courses_added, chunks_added)`; courses already present are
    /// not counted.
    pub async fn add_course_folder(
        &self,
        folder: &Path,
        processor: &DocumentProcessor,
    ) -> Result<(usize, usize), LecternError> {
        let (documents, found) = processor.process_folder(folder)?;
        let mut courses = 0;
        let mut chunks = 0;

        for document in documents {
            if let Some(added) = self.add_course(document).await? {
                courses += 1;
                chunks += added;
            }
        }

        info!(
            folder = %folder.display(),
            found,
            courses,
            chunks,
            "Course folder ingested"
        );
        Ok((courses, chunks))
    }

    /// Return the `k` chunks most similar to `query`, best first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, LecternError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed_boxed(query).await?;
        let hits = self.index.search(&query_vec, k)?;

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                content: hit.chunk.content,
                metadata: hit.chunk.metadata,
                score: hit.score,
            })
            .collect())
    }

    fn has_course(&self, title: &str) -> Result<bool, LecternError> {
        let titles = self
            .titles
            .read()
            .map_err(|e| LecternError::Storage(format!("Lock poisoned: {}", e)))?;
        Ok(titles.iter().any(|t| t == title))
    }

    /// Course titles in ingestion order.
    pub fn course_titles(&self) -> Result<Vec<String>, LecternError> {
        self.titles
            .read()
            .map(|t| t.clone())
            .map_err(|e| LecternError::Storage(format!("Lock poisoned: {}", e)))
    }

    /// Number of indexed courses.
    pub fn course_count(&self) -> usize {
        self.titles.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Catalog statistics.
    pub fn stats(&self) -> Result<CourseStats, LecternError> {
        Ok(CourseStats::from_titles(self.course_titles()?))
    }
}
