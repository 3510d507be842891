use serde::{Deserialize, Serialize};

use super::ExtractError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// System message pinning the model to strict JSON output. Shared by
/// every extraction call site.
pub const JSON_SYSTEM_PROMPT: &str = "You are a JSON formatter. Always respond with valid JSON \
     only. Never include comments, ellipses, or any text outside of the JSON structure. \
     Numbers should be unquoted.";

/// One extraction call: prompt plus sampling parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the service to constrain output to a JSON object.
    pub json_mode: bool,
}

/// Completion-model client abstraction (allows mocking for tests).
pub trait CompletionClient: Send + Sync {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ExtractError>;
}

impl<T: CompletionClient + ?Sized> CompletionClient for std::sync::Arc<T> {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ExtractError> {
        (**self).complete(request)
    }
}

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(api_key: &str, timeout_secs: u64) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, timeout_secs)
    }

    pub fn with_base_url(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ExtractError> {
        let _span = tracing::info_span!(
            "completion",
            model = request.model,
            prompt_len = request.prompt.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt,
        });

        let body = ChatCompletionBody {
            model: request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractError::Unreachable(self.base_url.clone())
                } else if e.is_timeout() {
                    ExtractError::Timeout(self.timeout_secs)
                } else {
                    ExtractError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| ExtractError::Http(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ExtractError::EmptyResponse);
        }

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            content_len = content.len(),
            "Completion received"
        );

        Ok(content)
    }
}

/// Mock completion client for testing — returns a configurable response.
pub struct MockCompletionClient {
    response: String,
}

impl MockCompletionClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl CompletionClient for MockCompletionClient {
    fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, ExtractError> {
        if self.response.trim().is_empty() {
            return Err(ExtractError::EmptyResponse);
        }
        Ok(self.response.clone())
    }
}
