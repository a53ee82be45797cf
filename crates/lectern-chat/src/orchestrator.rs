//! Query orchestrator: resolves the session, retrieves course context,
//! generates an answer and records the exchange.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lectern_core::config::LecternConfig;
use lectern_core::types::RetrievedChunk;

use crate::error::ChatError;
use crate::generator::AnswerGenerator;
use crate::retrieval::Retriever;
use crate::session::SessionStore;

/// Result of answering one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    /// Distinct source identifiers of the retrieved context, in rank order.
    pub sources: Vec<String>,
    pub session_id: String,
}

/// Coordinates sessions, retrieval and generation for each query.
pub struct QueryOrchestrator {
    sessions: Arc<SessionStore>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    max_results: usize,
    generation_timeout: Duration,
}

impl QueryOrchestrator {
    pub fn new(
        sessions: Arc<SessionStore>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
        max_results: usize,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            retriever,
            generator,
            max_results,
            generation_timeout,
        }
    }

    /// Build an orchestrator with session, search and generation limits from
    /// `config`.
    pub fn from_config(
        config: &LecternConfig,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self::new(
            Arc::new(SessionStore::from_config(&config.session)),
            retriever,
            generator,
            config.search.max_results,
            Duration::from_secs(config.generation.timeout_secs),
        )
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Answer `query` within the given session, creating one if absent.
    ///
    /// A supplied session id is returned unchanged even if the store has
    /// never seen it. The exchange is recorded only when generation
    /// succeeds.
    pub async fn answer(
        &self,
        query: &str,
        session_id: Option<String>,
    ) -> Result<QueryAnswer, ChatError> {
        let session_id = match session_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self.sessions.create_session()?,
        };

        let history = self.sessions.get_history(&session_id)?;
        debug!(
            session_id = %session_id,
            history_turns = history.len(),
            "Answering query"
        );

        let context = self.retriever.retrieve(query, self.max_results).await?;

        let answer = tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(query, &context, &history),
        )
        .await
        .map_err(|_| {
            warn!(
                session_id = %session_id,
                generator = self.generator.name(),
                "Answer generation timed out"
            );
            ChatError::Timeout(self.generation_timeout.as_secs())
        })??;

        self.sessions.add_exchange(&session_id, query, &answer)?;

        let sources = distinct_sources(&context);
        info!(
            session_id = %session_id,
            chunks = context.len(),
            sources = sources.len(),
            "Query answered"
        );

        Ok(QueryAnswer {
            answer,
            sources,
            session_id,
        })
    }
}

/// Source identifiers of `chunks` with duplicates removed, first occurrence kept.
fn distinct_sources(chunks: &[RetrievedChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for chunk in chunks {
        if !sources.contains(&chunk.metadata.source) {
            sources.push(chunk.metadata.source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lectern_core::types::{ChunkMetadata, Turn};

    use crate::generator::ExtractiveGenerator;

    fn chunk(source: &str, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            content: content.to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                course_title: "Course 1: Introduction to Python".to_string(),
                lesson_number: None,
                chunk_index: 0,
            },
            score: 0.5,
        }
    }

    struct FixedRetriever(Vec<RetrievedChunk>);

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str, k: usize) -> Result<Vec<RetrievedChunk>, ChatError> {
            Ok(self.0.iter().take(k).cloned().collect())
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<RetrievedChunk>, ChatError> {
            Err(ChatError::Retrieval("RAG system error".to_string()))
        }
    }

    /// Answers "answer to <query>" and records the history it was given.
    #[derive(Default)]
    struct RecordingGenerator {
        seen: Mutex<Vec<Vec<Turn>>>,
    }

    #[async_trait]
    impl AnswerGenerator for RecordingGenerator {
        async fn generate(
            &self,
            query: &str,
            _context: &[RetrievedChunk],
            history: &[Turn],
        ) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(history.to_vec());
            Ok(format!("answer to {}", query))
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl AnswerGenerator for FailingGenerator {
        async fn generate(
            &self,
            _query: &str,
            _context: &[RetrievedChunk],
            _history: &[Turn],
        ) -> Result<String, ChatError> {
            Err(ChatError::Generation("model overloaded".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl AnswerGenerator for SlowGenerator {
        async fn generate(
            &self,
            _query: &str,
            _context: &[RetrievedChunk],
            _history: &[Turn],
        ) -> Result<String, ChatError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn orchestrator(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> QueryOrchestrator {
        QueryOrchestrator::new(
            Arc::new(SessionStore::new(2, 60)),
            retriever,
            generator,
            5,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_answer_creates_session_when_absent() {
        let orch = orchestrator(
            Arc::new(FixedRetriever(vec![chunk("course1.txt", "Python basics")])),
            Arc::new(RecordingGenerator::default()),
        );

        let result = orch.answer("What is Python?", None).await.unwrap();
        assert_eq!(result.answer, "answer to What is Python?");
        assert_eq!(result.sources, vec!["course1.txt"]);
        assert!(!result.session_id.is_empty());
        assert!(orch.sessions().contains(&result.session_id));
    }

    #[tokio::test]
    async fn test_empty_session_id_treated_as_absent() {
        let orch = orchestrator(
            Arc::new(FixedRetriever(vec![])),
            Arc::new(RecordingGenerator::default()),
        );
        let result = orch.answer("q", Some(String::new())).await.unwrap();
        assert!(!result.session_id.is_empty());
    }

    #[tokio::test]
    async fn test_supplied_session_id_echoed() {
        let generator = Arc::new(RecordingGenerator::default());
        let orch = orchestrator(Arc::new(FixedRetriever(vec![])), generator.clone());

        let result = orch
            .answer("hello", Some("test-session-123".to_string()))
            .await
            .unwrap();
        assert_eq!(result.session_id, "test-session-123");
        // Unknown id starts with empty history.
        assert!(generator.seen.lock().unwrap()[0].is_empty());
        assert_eq!(
            orch.sessions().get_history("test-session-123").unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_follow_up_sees_prior_exchange() {
        let generator = Arc::new(RecordingGenerator::default());
        let orch = orchestrator(Arc::new(FixedRetriever(vec![])), generator.clone());

        let first = orch.answer("What is Python?", None).await.unwrap();
        orch.answer("Tell me more", Some(first.session_id.clone()))
            .await
            .unwrap();

        let seen = generator.seen.lock().unwrap();
        assert_eq!(
            seen[1],
            vec![
                Turn::user("What is Python?"),
                Turn::assistant("answer to What is Python?")
            ]
        );
    }

    #[tokio::test]
    async fn test_history_bounded() {
        let generator = Arc::new(RecordingGenerator::default());
        let orch = orchestrator(Arc::new(FixedRetriever(vec![])), generator.clone());
        let sid = Some("s".to_string());

        for q in ["q1", "q2", "q3", "q4"] {
            orch.answer(q, sid.clone()).await.unwrap();
        }

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[3].len(), 4);
        assert_eq!(seen[3][0], Turn::user("q2"));
    }

    #[tokio::test]
    async fn test_sources_deduplicated_in_rank_order() {
        let orch = orchestrator(
            Arc::new(FixedRetriever(vec![
                chunk("course2.txt", "a"),
                chunk("course1.txt", "b"),
                chunk("course2.txt", "c"),
            ])),
            Arc::new(RecordingGenerator::default()),
        );
        let result = orch.answer("q", None).await.unwrap();
        assert_eq!(result.sources, vec!["course2.txt", "course1.txt"]);
    }

    #[tokio::test]
    async fn test_max_results_passed_to_retriever() {
        let chunks: Vec<RetrievedChunk> = (0..10)
            .map(|i| chunk(&format!("c{}.txt", i), "x"))
            .collect();
        let orch = QueryOrchestrator::new(
            Arc::new(SessionStore::new(2, 60)),
            Arc::new(FixedRetriever(chunks)),
            Arc::new(RecordingGenerator::default()),
            3,
            Duration::from_secs(5),
        );
        let result = orch.answer("q", None).await.unwrap();
        assert_eq!(result.sources.len(), 3);
    }

    #[tokio::test]
    async fn test_retrieval_failure_records_nothing() {
        let orch = orchestrator(
            Arc::new(FailingRetriever),
            Arc::new(RecordingGenerator::default()),
        );
        let err = orch
            .answer("q", Some("sess".to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("RAG system error"));
        assert!(orch.sessions().get_history("sess").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_records_nothing() {
        let orch = orchestrator(Arc::new(FixedRetriever(vec![])), Arc::new(FailingGenerator));
        let err = orch
            .answer("q", Some("sess".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Generation(_)));
        assert!(!orch.sessions().contains("sess"));
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let orch = QueryOrchestrator::new(
            Arc::new(SessionStore::new(2, 60)),
            Arc::new(FixedRetriever(vec![])),
            Arc::new(SlowGenerator),
            5,
            Duration::from_millis(50),
        );
        let err = orch
            .answer("q", Some("sess".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Timeout(_)));
        assert!(!orch.sessions().contains("sess"));
    }

    #[tokio::test]
    async fn test_from_config_with_extractive_generator() {
        let config = LecternConfig::default();
        let orch = QueryOrchestrator::from_config(
            &config,
            Arc::new(FixedRetriever(vec![chunk("course1.txt", "Python is versatile.")])),
            Arc::new(ExtractiveGenerator::default()),
        );
        let result = orch.answer("python", None).await.unwrap();
        assert!(result.answer.contains("Python is versatile."));
        assert_eq!(result.sources, vec!["course1.txt"]);
    }

    #[tokio::test]
    async fn test_concurrent_queries_distinct_sessions() {
        let orch = Arc::new(orchestrator(
            Arc::new(FixedRetriever(vec![])),
            Arc::new(RecordingGenerator::default()),
        ));

        let mut handles = Vec::new();
        for i in 0..10 {
            let orch = orch.clone();
            handles.push(tokio::spawn(async move {
                orch.answer(&format!("q{}", i), None).await.unwrap()
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().session_id);
        }
        assert_eq!(ids.len(), 10);
        assert_eq!(orch.sessions().session_count(), 10);
    }

    #[test]
    fn test_distinct_sources_empty() {
        assert!(distinct_sources(&[]).is_empty());
    }
}
