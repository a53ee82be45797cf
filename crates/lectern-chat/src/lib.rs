//! Query pipeline for Lectern.
//!
//! Provides the conversation session store, the retrieval and generation
//! capabilities, and the orchestrator that answers a query end to end.

pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod retrieval;
pub mod session;

pub use error::ChatError;
pub use generator::{AnswerGenerator, AnthropicGenerator, ExtractiveGenerator};
pub use orchestrator::{QueryAnswer, QueryOrchestrator};
pub use retrieval::{CourseAnalytics, Retriever};
pub use session::SessionStore;
