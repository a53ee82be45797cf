use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LecternError, Result};

/// Environment variable holding the Anthropic API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "LECTERN_PORT";

/// Top-level configuration for the Lectern service.
///
/// Loaded from `lectern.toml` by default. Each section corresponds to one
/// component of the query pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LecternConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub documents: DocumentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LecternConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LecternConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    ///
    /// The load error is handed back rather than logged, since this runs
    /// before the subscriber is installed.
    pub fn load_or_default(path: &Path) -> (Self, Option<LecternError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Apply overrides from the process environment.
    ///
    /// `ANTHROPIC_API_KEY` replaces the configured key when set and non-empty.
    /// `LECTERN_PORT` replaces the port when it parses as a `u16`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(PORT_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, api_key: Option<String>, port: Option<String>) {
        if let Some(key) = api_key.map(|k| k.trim().to_string()) {
            if !key.is_empty() {
                self.generation.anthropic_api_key = key;
            }
        }
        if let Some(raw) = port {
            match raw.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %raw, "Ignoring invalid {}", PORT_ENV),
            }
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.documents.chunk_size == 0 {
            return Err(LecternError::Config(
                "documents.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.documents.chunk_overlap >= self.documents.chunk_size {
            return Err(LecternError::Config(format!(
                "documents.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.documents.chunk_overlap, self.documents.chunk_size
            )));
        }
        if self.search.embedding_dim == 0 {
            return Err(LecternError::Config(
                "search.embedding_dim must be greater than 0".to_string(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(LecternError::Config(
                "generation.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Course document ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Folder scanned for course files at startup.
    pub docs_dir: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters of trailing context repeated at the start of the next chunk.
    pub chunk_overlap: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            docs_dir: "../docs".to_string(),
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Embedding model name.
    pub embedding_model: String,
    /// Embedding dimension.
    pub embedding_dim: usize,
    /// Number of chunks retrieved per query.
    pub max_results: usize,
    /// Vector store location. Only `:memory:` is supported.
    pub vector_store_path: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dim: 384,
            max_results: 5,
            vector_store_path: ":memory:".to_string(),
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Anthropic API key. Empty selects the extractive generator.
    pub anthropic_api_key: String,
    /// Anthropic model identifier.
    pub anthropic_model: String,
    /// Anthropic API base URL.
    pub base_url: String,
    /// Maximum tokens in a generated answer.
    pub max_tokens: u32,
    /// Upper bound on a single generation call, in seconds.
    pub timeout_secs: u64,
}

impl GenerationConfig {
    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        !self.anthropic_api_key.trim().is_empty()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: String::new(),
            anthropic_model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 800,
            timeout_secs: 30,
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Exchanges (user + assistant pairs) retained per session.
    pub max_history: usize,
    /// Minutes of inactivity before a session is evicted. 0 disables eviction.
    pub idle_timeout_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: 2,
            idle_timeout_minutes: 60,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = LecternConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.documents.chunk_size, 800);
        assert_eq!(config.documents.chunk_overlap, 100);
        assert_eq!(config.search.embedding_model, "all-MiniLM-L6-v2");
        assert_eq!(config.search.vector_store_path, ":memory:");
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.session.max_history, 2);
        assert!(config.generation.anthropic_api_key.is_empty());
        assert!(!config.generation.has_api_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[server]
host = "0.0.0.0"
port = 9100

[documents]
docs_dir = "/srv/courses"
chunk_size = 500
chunk_overlap = 50

[generation]
anthropic_api_key = "sk-test"
timeout_secs = 10
"#;
        let file = create_temp_config(content);
        let config = LecternConfig::load(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.documents.docs_dir, "/srv/courses");
        assert_eq!(config.documents.chunk_size, 500);
        assert!(config.generation.has_api_key());
        assert_eq!(config.generation.timeout_secs, 10);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[logging]
level = "debug"
"#;
        let file = create_temp_config(content);
        let config = LecternConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.session.idle_timeout_minutes, 60);
    }

    #[test]
    fn test_load_invalid_toml_returns_config_error() {
        let file = create_temp_config("server = [[[");
        let err = LecternConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, LecternError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let (config, err) = LecternConfig::load_or_default(Path::new("/nonexistent/lectern.toml"));
        assert_eq!(config.documents.docs_dir, "../docs");
        assert!(matches!(err, Some(LecternError::Io(_))));
    }

    #[test]
    fn test_load_or_default_malformed_file_reports_error() {
        let file = create_temp_config("[server]\nport = \"not a number\"\n");
        let (config, err) = LecternConfig::load_or_default(file.path());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, "info");
        let err = err.expect("malformed file should report an error");
        assert!(matches!(err, LecternError::Config(_)));
    }

    #[test]
    fn test_load_or_default_valid_file_has_no_error() {
        let file = create_temp_config("[server]\nport = 9200\n");
        let (config, err) = LecternConfig::load_or_default(file.path());
        assert_eq!(config.server.port, 9200);
        assert!(err.is_none());
    }

    #[test]
    fn test_overrides_set_api_key_and_port() {
        let mut config = LecternConfig::default();
        config.apply_overrides(Some("test-api-key-12345".to_string()), Some("9001".to_string()));
        assert_eq!(config.generation.anthropic_api_key, "test-api-key-12345");
        assert_eq!(config.server.port, 9001);
    }

    #[test]
    fn test_overrides_ignore_blank_key_and_bad_port() {
        let mut config = LecternConfig::default();
        config.generation.anthropic_api_key = "from-file".to_string();
        config.apply_overrides(Some("   ".to_string()), Some("not-a-port".to_string()));
        assert_eq!(config.generation.anthropic_api_key, "from-file");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_missing_api_key_leaves_default() {
        let mut config = LecternConfig::default();
        config.apply_overrides(None, None);
        assert!(!config.generation.has_api_key());
    }

    #[test]
    fn test_validate_rejects_overlap_not_smaller_than_chunk() {
        let mut config = LecternConfig::default();
        config.documents.chunk_overlap = config.documents.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = LecternConfig::default();
        config.documents.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = LecternConfig::default();
        config.search.embedding_dim = 0;
        assert!(config.validate().is_err());

        let mut config = LecternConfig::default();
        config.generation.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
