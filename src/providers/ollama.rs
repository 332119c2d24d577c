use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use log::error;
use url::Url;

use crate::errors::ProviderError;
use crate::translation::conversation::ChatMessage;

/// Client for a local inference server speaking the Ollama chat protocol
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the server
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    /// Context window (prompt plus generation)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    /// Batch size used for prompt processing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_batch: Option<u32>,
    /// Sequences that end generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Chat response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Model name
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Create a new non-streaming chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            stream: Some(false),
        }
    }

    /// Set generation options
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Normalize an endpoint string into a base URL with scheme and port
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    if endpoint.is_empty() {
        return Err(ProviderError::ConnectionError("Endpoint cannot be empty".to_string()));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)
    } else {
        Url::parse(&format!("http://{}", endpoint))
    }
    .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint {}: {}", endpoint, e)))?;

    let host = url.host_str()
        .ok_or_else(|| ProviderError::ConnectionError(format!("Invalid host in endpoint: {}", endpoint)))?;
    let port = url.port().unwrap_or(if url.scheme() == "https" { 443 } else { 80 });

    Ok(format!("{}://{}:{}", url.scheme(), host, port))
}

impl Ollama {
    /// Create a client for the server at `endpoint`
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: normalize_endpoint(endpoint)?,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                // Ollama uses HTTP/1.1
                .http1_only()
                .build()
                .unwrap_or_default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat with the server
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self.client.post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send chat request to Ollama API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to get response text from Ollama API: {}", e)))?;

        parse_chat_response(&response_text)
    }
}

/// Parse a chat response, accepting a streamed (JSONL) body as well
pub fn parse_chat_response(response_text: &str) -> Result<ChatResponse, ProviderError> {
    let error = match serde_json::from_str::<ChatResponse>(response_text) {
        Ok(chat_response) => return Ok(chat_response),
        Err(e) => e,
    };

    // The body may be a stream of JSON objects, one per line, ending with a
    // "done" object. Concatenate the message pieces.
    let chunks: Vec<serde_json::Value> = response_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    let Some(last) = chunks.last() else {
        error!("Failed to parse Ollama API chat response: {}. Raw response (first 500 chars): {}",
              error, response_text.chars().take(500).collect::<String>());
        return Err(ProviderError::ParseError(format!(
            "Failed to parse Ollama API chat response: {}. Response contains invalid JSON.", error
        )));
    };

    let content: String = chunks.iter()
        .filter_map(|chunk| chunk.get("message")?.get("content")?.as_str())
        .collect();

    Ok(ChatResponse {
        model: last.get("model").and_then(|v| v.as_str()).unwrap_or("unknown").to_string(),
        message: ChatMessage::new("assistant", content),
        done: last.get("done").and_then(|v| v.as_bool()).unwrap_or(true),
        prompt_eval_count: last.get("prompt_eval_count").and_then(|v| v.as_u64()),
        eval_count: last.get("eval_count").and_then(|v| v.as_u64()),
    })
}
