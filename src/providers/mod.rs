/*!
 * Generation backends.
 *
 * Every backend exposes the same capability: take a chat conversation and
 * return the generated text. The concrete variant is picked once per run from
 * a selector string:
 * - an existing directory: a local checkpoint (raw large-model layout or a
 *   fine-tuned pipeline checkpoint)
 * - `openai` (any case): the hosted OpenAI API
 */

use async_trait::async_trait;
use log::info;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::app_config::BackendConfig;
use crate::errors::{ProviderError, ScribeError, ScribeResult};
use crate::translation::conversation::ChatConversation;

pub mod local;
pub mod ollama;
pub mod openai;

use self::local::{is_large_checkpoint, LargeLocalBackend, LocalCheckpointBackend};
use self::openai::{OpenAI, OpenAIRequest};

/// Reserved selector for the hosted provider
pub const HOSTED_PROVIDER: &str = "openai";

/// Environment variable holding the hosted provider's API key
pub const HOSTED_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Common trait for all generation backends
///
/// Orchestrators only depend on this trait, so tests can substitute a
/// scripted backend.
#[async_trait]
pub trait ModelBackend: Send + Sync + Debug {
    /// Generate a reply to the conversation.
    ///
    /// Failures are not retried here; they propagate to the caller.
    async fn chat(&self, conversation: &ChatConversation) -> Result<String, ProviderError>;

    /// Human-readable backend description for logs
    fn describe(&self) -> String;
}

/// Which backend variant a selector resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    LocalCheckpoint(PathBuf),
    LargeLocal(PathBuf),
    Hosted,
}

impl BackendKind {
    /// Resolve a selector without constructing anything
    pub fn resolve(selector: &str) -> ScribeResult<Self> {
        let path = Path::new(selector);
        if !selector.is_empty() && path.is_dir() {
            if is_large_checkpoint(path) {
                Ok(Self::LargeLocal(path.to_path_buf()))
            } else {
                Ok(Self::LocalCheckpoint(path.to_path_buf()))
            }
        } else if selector.eq_ignore_ascii_case(HOSTED_PROVIDER) {
            Ok(Self::Hosted)
        } else {
            Err(ScribeError::unresolved_selector(selector))
        }
    }
}

/// Hosted OpenAI backend using ambient credentials
#[derive(Debug, Clone)]
pub struct HostedBackend {
    client: OpenAI,
    model: String,
    max_tokens: u32,
    n: u32,
}

impl HostedBackend {
    pub fn new(config: &BackendConfig) -> ScribeResult<Self> {
        let hosted = &config.hosted;
        let api_key = if hosted.api_key.is_empty() {
            std::env::var(HOSTED_API_KEY_ENV).map_err(|_| {
                ScribeError::Configuration(format!(
                    "No API key configured for {} and {} is not set",
                    HOSTED_PROVIDER, HOSTED_API_KEY_ENV
                ))
            })?
        } else {
            hosted.api_key.clone()
        };

        Ok(Self {
            client: OpenAI::new(api_key, hosted.endpoint.clone(), config.timeout_secs),
            model: hosted.model.clone(),
            max_tokens: hosted.max_tokens,
            n: hosted.n,
        })
    }

    pub async fn chat(&self, conversation: &ChatConversation) -> Result<String, ProviderError> {
        let request = OpenAIRequest::new(&self.model, conversation.messages().to_vec(), self.max_tokens)
            .candidates(self.n);
        let response = self.client.complete(request).await?;
        OpenAI::extract_text_from_response(&response)
    }
}

/// Closed set of backend variants
#[derive(Debug, Clone)]
pub enum Backend {
    LocalCheckpoint(LocalCheckpointBackend),
    LargeLocal(LargeLocalBackend),
    Hosted(HostedBackend),
}

impl Backend {
    /// Construct the backend a selector names.
    ///
    /// Fails with a configuration error naming the selector when it is
    /// neither an existing directory nor the hosted provider name.
    pub fn from_selector(selector: &str, config: &BackendConfig) -> ScribeResult<Self> {
        let backend = match BackendKind::resolve(selector)? {
            BackendKind::LocalCheckpoint(dir) => Self::LocalCheckpoint(LocalCheckpointBackend::new(&dir, config)?),
            BackendKind::LargeLocal(dir) => Self::LargeLocal(LargeLocalBackend::new(&dir, config)?),
            BackendKind::Hosted => Self::Hosted(HostedBackend::new(config)?),
        };
        info!("Using backend: {}", backend.describe());
        Ok(backend)
    }
}

#[async_trait]
impl ModelBackend for Backend {
    async fn chat(&self, conversation: &ChatConversation) -> Result<String, ProviderError> {
        match self {
            Self::LocalCheckpoint(backend) => backend.chat(conversation).await,
            Self::LargeLocal(backend) => backend.chat(conversation).await,
            Self::Hosted(backend) => backend.chat(conversation).await,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::LocalCheckpoint(backend) => format!("checkpoint {}", backend.info().name),
            Self::LargeLocal(backend) => format!("large checkpoint {}", backend.info().name),
            Self::Hosted(backend) => format!("{} ({})", HOSTED_PROVIDER, backend.model),
        }
    }
}
