//! Lectern application binary - composition root.
//!
//! 1. Load configuration (TOML, then env, then CLI flags)
//! 2. Build the course store and ingest the docs folder
//! 3. Pick the answer generator (Anthropic, or extractive without a key)
//! 4. Start the axum REST API server

mod cli;

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use lectern_api::routes;
use lectern_api::state::AppState;
use lectern_chat::{AnswerGenerator, AnthropicGenerator, ExtractiveGenerator, QueryOrchestrator};
use lectern_core::config::{LecternConfig, API_KEY_ENV};
use lectern_core::error::LecternError;
use lectern_vector::{CourseStore, DocumentProcessor, HashingEmbedding};

use crate::cli::CliArgs;

/// Choose the generator from configuration.
fn build_generator(
    config: &LecternConfig,
) -> Result<Arc<dyn AnswerGenerator>, Box<dyn std::error::Error>> {
    if config.generation.has_api_key() {
        let generator = AnthropicGenerator::new(&config.generation)?;
        tracing::info!(model = %generator.model(), "Using Anthropic answer generation");
        Ok(Arc::new(generator))
    } else {
        tracing::warn!(
            "No Anthropic API key configured (set {}); answers will be extracted from course text",
            API_KEY_ENV
        );
        Ok(Arc::new(ExtractiveGenerator::new(config.search.max_results)))
    }
}

/// Ingest every course file under the configured docs folder.
async fn ingest_docs(store: &CourseStore, config: &LecternConfig) {
    let docs_dir = Path::new(&config.documents.docs_dir);
    if !docs_dir.is_dir() {
        tracing::warn!(
            path = %docs_dir.display(),
            "Docs folder not found; starting with an empty course catalog"
        );
        return;
    }

    let processor = DocumentProcessor::from_config(&config.documents);
    match store.add_course_folder(docs_dir, &processor).await {
        Ok((courses, chunks)) => {
            tracing::info!(courses, chunks, "Loaded course documents");
        }
        Err(e) => {
            tracing::error!(
                path = %docs_dir.display(),
                error = %e,
                "Failed to load course documents"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let (mut config, load_error) = LecternConfig::load_or_default(&config_file);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level(&config))),
        )
        .init();

    tracing::info!("Starting Lectern v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(LecternError::Io(ref e)) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %config_file.display(), "No configuration file; using defaults");
        }
        Some(e) => {
            tracing::warn!(
                path = %config_file.display(),
                error = %e,
                "Failed to load configuration; using defaults"
            );
        }
    }

    // Config: file < env < CLI.
    config.apply_env();
    args.apply_to(&mut config);

    config.validate()?;

    // Course store.
    let store = Arc::new(CourseStore::new(HashingEmbedding::new(
        config.search.embedding_dim,
    )));
    ingest_docs(&store, &config).await;

    // Query pipeline.
    let generator = build_generator(&config)?;
    let orchestrator = QueryOrchestrator::from_config(&config, store.clone(), generator);
    let state = AppState::new(orchestrator, store);

    // === API server ===
    if let Err(e) = routes::start_server(&config.server, state).await {
        tracing::error!(error = %e, "API server failed");
        return Err(e.into());
    }

    Ok(())
}
