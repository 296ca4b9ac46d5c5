//! LLM client: the single point of entry for all generative model calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
//! Pipeline code depends on the `TextGenerator` trait, which `LlmClient` implements.
//!
//! Model: claude-sonnet-4-5, fixed in code rather than configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
/// Transport-level ceiling. Pipeline stages apply their own, shorter, timeout.
const HTTP_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A document passed inline with the prompt, e.g. a CV as base64 PDF.
#[derive(Debug, Clone, Copy)]
pub struct InlineDocument<'a> {
    pub media_type: &'a str,
    pub base64: &'a str,
}

/// One single-turn model request. No conversation state, no streaming.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub system: &'a str,
    pub document: Option<InlineDocument<'a>>,
}

/// A generative text model. Output carries no structural guarantee;
/// callers must sanitize and validate it.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Document { source: DocumentSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct DocumentSource<'a> {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            api_key,
        })
    }

    /// Makes a single call to the Claude API, returning the full response object.
    /// Not retried: one model round-trip per pipeline step.
    pub async fn call(&self, request: GenerationRequest<'_>) -> Result<LlmResponse, LlmError> {
        let request_body = build_request_body(request);

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        response
            .text()
            .map(str::to_owned)
            .ok_or(LlmError::EmptyContent)
    }
}

fn build_request_body(request: GenerationRequest<'_>) -> AnthropicRequest<'_> {
    let mut content = Vec::with_capacity(2);
    if let Some(document) = request.document {
        content.push(ContentPart::Document {
            source: DocumentSource {
                source_type: "base64",
                media_type: document.media_type,
                data: document.base64,
            },
        });
    }
    content.push(ContentPart::Text {
        text: request.prompt,
    });

    AnthropicRequest {
        model: MODEL,
        max_tokens: MAX_TOKENS,
        system: request.system,
        messages: vec![AnthropicMessage {
            role: "user",
            content,
        }],
    }
}

/// Strips Markdown code-fence artifacts (```json ... ``` or ``` ... ```) from model output.
///
/// Text that already starts like JSON is returned as is, so backticks inside string
/// values survive. A fenced block preceded by prose is unwrapped too; the closing
/// fence is the last one in the text. Anything else is returned trimmed, so the
/// JSON parser gets to reject it.
pub fn sanitize_model_text(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with('{') || text.starts_with('[') {
        return text;
    }
    let fenced = match text.find("```") {
        Some(start) => &text[start + 3..],
        None => return text,
    };
    let body = strip_fence_tag(fenced);
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Drops the info string after an opening fence (`json`, `JSON`, or nothing).
fn strip_fence_tag(fenced: &str) -> &str {
    if let Some((tag, rest)) = fenced.split_once('\n') {
        if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
            return rest;
        }
    }
    fenced
        .strip_prefix("json")
        .or_else(|| fenced.strip_prefix("JSON"))
        .unwrap_or(fenced)
}
