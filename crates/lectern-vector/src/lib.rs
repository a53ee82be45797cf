//! Lectern vector crate - document processing, embeddings, vector index and
//! the course store.
//!
//! Provides sentence-aware chunking of course files, a hashing embedding
//! service, an in-memory cosine index and the store that ties them together.

pub mod document;
pub mod embedding;
pub mod index;
pub mod store;

pub use document::{chunk_text, clean_text, DocumentProcessor};
pub use embedding::{EmbeddingService, HashingEmbedding};
pub use index::{SearchHit, VectorIndex};
pub use store::CourseStore;
