//! In-memory vector index with brute-force cosine similarity search.
//!
//! All operations are O(n) for search, which is acceptable for a course
//! catalog of a few thousand chunks.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use lectern_core::error::LecternError;
use lectern_core::types::CourseChunk;

/// A single hit returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The ID of the matching vector entry.
    pub id: Uuid,
    /// Cosine similarity score (-1.0 to 1.0).
    pub score: f64,
    /// The chunk stored with the vector.
    pub chunk: CourseChunk,
}

#[derive(Debug, Clone)]
struct VectorEntry {
    embedding: Vec<f32>,
    chunk: CourseChunk,
    /// Insertion sequence, used to break score ties deterministically.
    seq: u64,
}

#[derive(Debug, Default)]
struct IndexInner {
    entries: HashMap<Uuid, VectorEntry>,
    next_seq: u64,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Thread-safe via interior RwLock. Cloning shares the same underlying index.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    inner: Arc<RwLock<IndexInner>>,
}

impl VectorIndex {
    /// Create a new empty vector index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vector with its chunk into the index.
    ///
    /// Overwrites any existing entry with the same ID.
    pub fn insert(
        &self,
        id: Uuid,
        embedding: Vec<f32>,
        chunk: CourseChunk,
    ) -> Result<(), LecternError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| LecternError::Storage(format!("Lock poisoned: {}", e)))?;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            id,
            VectorEntry {
                embedding,
                chunk,
                seq,
            },
        );
        Ok(())
    }

    /// Search for the k nearest neighbors to the query vector by cosine similarity.
    ///
    /// Returns results sorted by descending similarity score; equal scores
    /// keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, LecternError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| LecternError::Storage(format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<(u64, SearchHit)> = inner
            .entries
            .iter()
            .map(|(id, entry)| {
                (
                    entry.seq,
                    SearchHit {
                        id: *id,
                        score: cosine_similarity(query, &entry.embedding),
                        chunk: entry.chunk.clone(),
                    },
                )
            })
            .collect();

        scored.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    /// Return the number of vectors currently stored in the index.
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.entries.len()).unwrap_or(0)
    }

    /// Return true if the index contains no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
