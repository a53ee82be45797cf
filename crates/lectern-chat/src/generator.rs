//! Answer generation from retrieved course material.
//!
//! [`AnthropicGenerator`] calls the Anthropic Messages API. When no API key
//! is configured, [`ExtractiveGenerator`] composes an answer directly from
//! the retrieved chunks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lectern_core::config::GenerationConfig;
use lectern_core::types::{RetrievedChunk, Turn};

use crate::error::ChatError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You are an assistant for questions about course materials. \
Answer using the numbered course excerpts supplied with each question. \
If the excerpts do not cover the question, say so briefly instead of guessing. \
Keep answers concise and educational, and do not mention the excerpts or how they were retrieved.";

const NO_MATERIAL_ANSWER: &str = "I couldn't find any course material relevant to that question. \
Try rephrasing it or asking about a specific course or lesson.";

/// Produces an answer for a query from retrieved context and prior turns.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(
        &self,
        query: &str,
        context: &[RetrievedChunk],
        history: &[Turn],
    ) -> Result<String, ChatError>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

// =============================================================================
// Anthropic
// =============================================================================

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Anthropic Messages API.
pub struct AnthropicGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Generation(format!("failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!(
            base_url = %base_url,
            model = %config.anthropic_model,
            "Anthropic generator configured"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.anthropic_api_key.clone(),
            model: config.anthropic_model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_messages<'a>(
        query: &str,
        context: &[RetrievedChunk],
        history: &'a [Turn],
    ) -> Vec<Message<'a>> {
        let mut messages: Vec<Message<'a>> = history
            .iter()
            .map(|turn| Message {
                role: turn.role.as_str(),
                content: turn.content.clone(),
            })
            .collect();

        let prompt = if context.is_empty() {
            format!("No course material matched this question.\n\nQuestion: {}", query)
        } else {
            format!("Course materials:\n\n{}\n\nQuestion: {}", format_context(context), query)
        };
        messages.push(Message {
            role: "user",
            content: prompt,
        });
        messages
    }
}

#[async_trait]
impl AnswerGenerator for AnthropicGenerator {
    async fn generate(
        &self,
        query: &str,
        context: &[RetrievedChunk],
        history: &[Turn],
    ) -> Result<String, ChatError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system: SYSTEM_PROMPT,
            messages: Self::build_messages(query, context, history),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Generation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Generation(format!(
                "Anthropic API returned {}: {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Generation(format!("invalid response body: {}", e)))?;

        let answer: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if answer.trim().is_empty() {
            return Err(ChatError::Generation(
                "Anthropic API returned no text content".to_string(),
            ));
        }

        debug!(chars = answer.len(), "Anthropic answer received");
        Ok(answer)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Render retrieved chunks as a numbered list with course and lesson labels.
fn format_context(context: &[RetrievedChunk]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[{}] {}\n{}", i + 1, chunk_label(chunk), chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn chunk_label(chunk: &RetrievedChunk) -> String {
    match chunk.metadata.lesson_number {
        Some(n) => format!("{} - Lesson {}", chunk.metadata.course_title, n),
        None => chunk.metadata.course_title.clone(),
    }
}

// =============================================================================
// Extractive
// =============================================================================

/// Answers directly from retrieved chunks without a language model.
pub struct ExtractiveGenerator {
    /// Maximum number of chunks quoted in an answer.
    pub max_excerpts: usize,
}

impl ExtractiveGenerator {
    pub fn new(max_excerpts: usize) -> Self {
        Self {
            max_excerpts: max_excerpts.max(1),
        }
    }

    fn compose(&self, context: &[RetrievedChunk]) -> String {
        if context.is_empty() {
            return NO_MATERIAL_ANSWER.to_string();
        }

        let limited = &context[..context.len().min(self.max_excerpts)];
        if limited.len() == 1 {
            let chunk = &limited[0];
            return format!("From {}: {}", chunk_label(chunk), excerpt(&chunk.content));
        }

        let mut answer = String::from("Here is what the course materials say:");
        for chunk in limited {
            answer.push_str(&format!(
                "\n- From {}: {}",
                chunk_label(chunk),
                excerpt(&chunk.content)
            ));
        }
        answer
    }
}

impl Default for ExtractiveGenerator {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl AnswerGenerator for ExtractiveGenerator {
    async fn generate(
        &self,
        _query: &str,
        context: &[RetrievedChunk],
        _history: &[Turn],
    ) -> Result<String, ChatError> {
        Ok(self.compose(context))
    }

    fn name(&self) -> &'static str {
        "extractive"
    }
}

/// Truncate to about 300 characters on a char boundary.
fn excerpt(content: &str) -> String {
    const MAX_CHARS: usize = 300;
    let trimmed = content.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_CHARS).collect();
    format!("{}...", cut.trim_end())
}
