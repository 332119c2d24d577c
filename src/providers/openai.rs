use std::time::Duration;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::error;

use crate::errors::ProviderError;
use crate::translation::conversation::ChatMessage;

/// OpenAI client for the chat completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Maximum number of tokens to generate
    max_tokens: u32,

    /// Number of candidate completions
    n: u32,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Candidate completions
    pub choices: Vec<OpenAIChoice>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// One candidate completion
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// Index of the candidate
    #[serde(default)]
    pub index: u32,
    /// Generated message
    pub message: OpenAIMessage,
}

/// Message in a completion; content may be null for refusals or tool calls
#[derive(Debug, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl OpenAIRequest {
    /// Create a new chat completion request for a single candidate
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
            n: 1,
        }
    }

    /// Set the number of candidate completions
    pub fn candidates(mut self, n: u32) -> Self {
        self.n = n;
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Complete a chat request
    pub async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let api_url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let response = self.client.post(&api_url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to OpenAI API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationError(error_text),
                code => ProviderError::ApiError { status_code: code, message: error_text },
            });
        }

        response.json::<OpenAIResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))
    }

    /// Extract the first candidate's text
    pub fn extract_text_from_response(response: &OpenAIResponse) -> Result<String, ProviderError> {
        response.choices.iter()
            .min_by_key(|choice| choice.index)
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::ParseError("OpenAI response contained no message content".to_string()))
    }
}
