//! Error types for the query pipeline.

use lectern_core::error::LecternError;

/// Errors from the query pipeline.
///
/// Every variant's display text includes the underlying failure message
/// verbatim; the HTTP layer forwards it to the client.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("generation timed out after {0} seconds")]
    Timeout(u64),
    #[error("analytics failed: {0}")]
    Analytics(String),
    #[error("session store error: {0}")]
    Storage(String),
}

impl From<LecternError> for ChatError {
    fn from(err: LecternError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::Retrieval("RAG system error".to_string());
        assert_eq!(err.to_string(), "retrieval failed: RAG system error");

        let err = ChatError::Generation("model overloaded".to_string());
        assert_eq!(err.to_string(), "generation failed: model overloaded");

        let err = ChatError::Timeout(30);
        assert_eq!(err.to_string(), "generation timed out after 30 seconds");

        let err = ChatError::Analytics("Analytics error".to_string());
        assert_eq!(err.to_string(), "analytics failed: Analytics error");

        let err = ChatError::Storage("lock poisoned".to_string());
        assert_eq!(err.to_string(), "session store error: lock poisoned");
    }

    #[test]
    fn test_chat_error_from_lectern_error() {
        let err: ChatError = LecternError::Storage("connection lost".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("connection lost"));
    }

    #[test]
    fn test_chat_error_unicode_inner_messages() {
        let err = ChatError::Generation("model error: \u{1f4a5}".to_string());
        assert!(err.to_string().contains("\u{1f4a5}"));
    }

    #[test]
    fn test_chat_error_very_long_inner_message() {
        let long_msg = "x".repeat(10_000);
        let err = ChatError::Retrieval(long_msg.clone());
        assert_eq!(err.to_string(), format!("retrieval failed: {}", long_msg));
    }
}
