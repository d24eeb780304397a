/// LLM Client — the single point of entry for all completion-service calls.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// Callers depend on the `CompletionService` trait so tests can swap in a stub.
///
/// Model: gpt-4o-mini, temperature 0.5 (hardcoded — do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
pub mod stub;

/// The model used for all completion calls.
pub const MODEL: &str = "gpt-4o-mini";
pub const TEMPERATURE: f32 = 0.5;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingApiKey,

    #[error("request timed out: {0}")]
    Timeout(reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("completion refused: {0}")]
    Refusal(String),

    #[error("completion returned empty content")]
    EmptyContent,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err)
        } else {
            LlmError::Http(err)
        }
    }
}

impl LlmError {
    /// Stable name of the failure, surfaced to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::MissingApiKey => "MissingApiKey",
            LlmError::Timeout(_) => "Timeout",
            LlmError::Http(_) => "HttpError",
            LlmError::Api { .. } => "ApiError",
            LlmError::Parse(_) => "JsonDecodeError",
            LlmError::Refusal(_) => "Refusal",
            LlmError::EmptyContent => "EmptyContent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A named JSON schema the completion service must conform to.
#[derive(Debug, Clone)]
pub struct JsonSchemaFormat {
    pub name: &'static str,
    pub schema: Value,
    pub strict: bool,
}

/// How the completion service is asked to shape its output.
#[derive(Debug, Clone)]
pub enum ResponseMode {
    /// Schema-constrained decoding.
    JsonSchema(JsonSchemaFormat),
    /// Any valid JSON object; keys are not enforced.
    JsonObject,
}

impl ResponseMode {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseMode::JsonSchema(_) => "json_schema",
            ResponseMode::JsonObject => "json_object",
        }
    }
}

/// Raw completion output. Implementations that decode structured output
/// themselves return `Parsed`; otherwise the caller parses `Text`.
#[derive(Debug, Clone)]
pub enum CompletionOutput {
    Parsed(Value),
    Text(String),
}

/// The completion capability. Carried in `AppState` as `Arc<dyn CompletionService>`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        mode: &ResponseMode,
    ) -> Result<CompletionOutput, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

/// Responses API request (used for schema-constrained calls).
#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a [ChatMessage],
    text: TextConfig<'a>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct TextConfig<'a> {
    format: SchemaTextFormat<'a>,
}

#[derive(Debug, Serialize)]
struct SchemaTextFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    name: &'a str,
    schema: &'a Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    usage: Option<ResponsesUsage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponsesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ResponsesResponse {
    /// Extracts the first output text, honouring refusals.
    fn into_text(self) -> Result<String, LlmError> {
        if let Some(text) = self.output_text.filter(|t| !t.trim().is_empty()) {
            return Ok(text);
        }

        for item in self.output.into_iter().filter(|i| i.item_type == "message") {
            for block in item.content {
                match block.content_type.as_str() {
                    "output_text" => {
                        if let Some(text) = block.text.filter(|t| !t.trim().is_empty()) {
                            return Ok(text);
                        }
                    }
                    "refusal" => {
                        return Err(LlmError::Refusal(block.refusal.unwrap_or_default()));
                    }
                    _ => {}
                }
            }
        }

        Err(LlmError::EmptyContent)
    }
}

/// Chat Completions request (used for JSON-object calls).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    response_format: ChatResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        let message = self
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(LlmError::EmptyContent)?;

        if let Some(refusal) = message.refusal {
            return Err(LlmError::Refusal(refusal));
        }
        message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The HTTP-backed completion client.
///
/// A missing API key is tolerated at construction; every call then fails with
/// `LlmError::MissingApiKey`. No retries happen here: the tailoring flow owns
/// the single fallback.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Schema-constrained call through the Responses API.
    async fn call_json_schema(
        &self,
        messages: &[ChatMessage],
        format: &JsonSchemaFormat,
    ) -> Result<String, LlmError> {
        let body = ResponsesRequest {
            model: MODEL,
            input: messages,
            text: TextConfig {
                format: SchemaTextFormat {
                    format_type: "json_schema",
                    name: format.name,
                    schema: &format.schema,
                    strict: format.strict,
                },
            },
            temperature: TEMPERATURE,
        };

        let response: ResponsesResponse = self.post_json("responses", &body).await?;
        if let Some(usage) = &response.usage {
            debug!(
                "json_schema call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }
        response.into_text()
    }

    /// JSON-object call through Chat Completions.
    async fn call_json_object(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: MODEL,
            messages,
            response_format: ChatResponseFormat {
                format_type: "json_object",
            },
            temperature: TEMPERATURE,
        };

        let response: ChatResponse = self.post_json("chat/completions", &body).await?;
        if let Some(usage) = &response.usage {
            debug!(
                "json_object call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        response.into_text()
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Completion API returned {}", status);
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        mode: &ResponseMode,
    ) -> Result<CompletionOutput, LlmError> {
        let text = match mode {
            ResponseMode::JsonSchema(format) => self.call_json_schema(messages, format).await?,
            ResponseMode::JsonObject => self.call_json_object(messages).await?,
        };
        debug!(mode = mode.label(), bytes = text.len(), "Completion received");
        Ok(CompletionOutput::Text(text))
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
