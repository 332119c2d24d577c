/*!
 * Backends for on-disk checkpoints.
 *
 * A checkpoint directory is served by a local inference server; these
 * backends read the directory's metadata, pick the generation options for
 * the checkpoint layout and talk to the server.
 */

use log::debug;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::app_config::BackendConfig;
use crate::errors::{ProviderError, ScribeError, ScribeResult};
use crate::file_utils::FileManager;
use crate::translation::conversation::ChatConversation;

use super::ollama::{ChatRequest, GenerationOptions, Ollama};

/// Tokenizer file of a raw large-model checkpoint
pub const LARGE_CHECKPOINT_TOKENIZER: &str = "tokenizer.model";

/// Model hyper-parameters of a raw large-model checkpoint
pub const LARGE_CHECKPOINT_PARAMS: &str = "params.json";

/// Whether `dir` has the raw large-model layout rather than a fine-tuned
/// checkpoint with a generation pipeline
pub fn is_large_checkpoint(dir: &Path) -> bool {
    FileManager::file_exists(dir.join(LARGE_CHECKPOINT_TOKENIZER))
        && FileManager::file_exists(dir.join(LARGE_CHECKPOINT_PARAMS))
}

/// Metadata read from a checkpoint directory
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointInfo {
    /// Directory the checkpoint was read from
    pub dir: PathBuf,
    /// Name the checkpoint is served under
    pub name: String,
    /// End-of-sequence token text, when the tokenizer declares one
    pub eos_token: Option<String>,
    /// End-of-sequence token id. The chat protocol takes no token ids, so
    /// this is logged only; `eos_token` is sent as a stop sequence instead.
    pub eos_token_id: Option<u64>,
    /// Padding token id. Logged only; the server pads on its own.
    pub pad_token_id: u64,
}

impl CheckpointInfo {
    /// Read checkpoint metadata from `generation_config.json`, `config.json`
    /// and `tokenizer_config.json`. Missing files leave fields unset.
    pub fn read(dir: &Path, served_model: Option<&str>, default_pad_token_id: u64) -> ScribeResult<Self> {
        let generation = read_json(&dir.join("generation_config.json"))?;
        let model_config = read_json(&dir.join("config.json"))?;
        let tokenizer = read_json(&dir.join("tokenizer_config.json"))?;

        let lookup = |key: &str| {
            [&generation, &model_config]
                .into_iter()
                .flatten()
                .find_map(|doc| token_id(doc.get(key)?))
        };

        let eos_token = tokenizer.as_ref().and_then(|doc| match doc.get("eos_token")? {
            Value::String(text) => Some(text.clone()),
            Value::Object(map) => map.get("content")?.as_str().map(str::to_string),
            _ => None,
        });

        let name = match served_model {
            Some(name) => name.to_string(),
            None => dir_name(dir)?,
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            name,
            eos_token,
            eos_token_id: lookup("eos_token_id"),
            pad_token_id: lookup("pad_token_id").unwrap_or(default_pad_token_id),
        })
    }
}

/// Token ids are either a number or a list whose first entry is used
fn token_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::Array(items) => items.first().and_then(Value::as_u64),
        _ => None,
    }
}

fn read_json(path: &Path) -> ScribeResult<Option<Value>> {
    if !FileManager::file_exists(path) {
        return Ok(None);
    }
    let text = FileManager::read_to_string(path)?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| ScribeError::Configuration(format!("Invalid checkpoint metadata {:?}: {}", path, e)))
}

fn dir_name(dir: &Path) -> ScribeResult<String> {
    // Resolve "." and trailing separators before taking the last component
    let resolved = dir.canonicalize().map_err(|e| ScribeError::file(dir, e))?;
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| ScribeError::Configuration(format!("Cannot name checkpoint at {:?}", dir)))
}

async fn chat_with(
    client: &Ollama,
    model: &str,
    options: &GenerationOptions,
    conversation: &ChatConversation,
) -> Result<String, ProviderError> {
    let request = ChatRequest::new(model, conversation.messages().to_vec())
        .options(options.clone());
    let response = client.chat(request).await?;
    Ok(response.message.content)
}

/// Fine-tuned checkpoint driven through a text-generation pipeline
#[derive(Debug, Clone)]
pub struct LocalCheckpointBackend {
    client: Ollama,
    info: CheckpointInfo,
    options: GenerationOptions,
}

impl LocalCheckpointBackend {
    pub fn new(dir: &Path, config: &BackendConfig) -> ScribeResult<Self> {
        let info = CheckpointInfo::read(
            dir,
            config.served_model.as_deref(),
            u64::from(config.local.pad_token_id),
        )?;
        let client = Ollama::new(&config.local_endpoint, config.timeout_secs)?;

        let options = GenerationOptions {
            num_predict: Some(config.local.max_new_tokens),
            num_batch: Some(config.local.batch_size),
            stop: info.eos_token.clone().map(|eos| vec![eos]),
            ..Default::default()
        };

        debug!(
            "Checkpoint {} at {:?}: eos={:?} (id {:?}), pad id {}, served by {}",
            info.name, info.dir, info.eos_token, info.eos_token_id, info.pad_token_id, client.base_url()
        );

        Ok(Self { client, info, options })
    }

    pub fn info(&self) -> &CheckpointInfo {
        &self.info
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub async fn chat(&self, conversation: &ChatConversation) -> Result<String, ProviderError> {
        chat_with(&self.client, &self.info.name, &self.options, conversation).await
    }
}

/// Raw large-model checkpoint with explicit sampling parameters
#[derive(Debug, Clone)]
pub struct LargeLocalBackend {
    client: Ollama,
    info: CheckpointInfo,
    options: GenerationOptions,
}

impl LargeLocalBackend {
    pub fn new(dir: &Path, config: &BackendConfig) -> ScribeResult<Self> {
        let info = CheckpointInfo::read(
            dir,
            config.served_model.as_deref(),
            u64::from(config.local.pad_token_id),
        )?;
        let client = Ollama::new(&config.local_endpoint, config.timeout_secs)?;

        let large = &config.large_local;
        let options = GenerationOptions {
            temperature: Some(large.temperature),
            top_p: Some(large.top_p),
            num_ctx: Some(large.max_seq_len),
            num_batch: Some(large.max_batch_size),
            num_predict: large.max_gen_len,
            ..Default::default()
        };

        debug!(
            "Large checkpoint {} at {:?}: max_seq_len {}, temperature {}, top_p {}",
            info.name, info.dir, large.max_seq_len, large.temperature, large.top_p
        );

        Ok(Self { client, info, options })
    }

    pub fn info(&self) -> &CheckpointInfo {
        &self.info
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub async fn chat(&self, conversation: &ChatConversation) -> Result<String, ProviderError> {
        chat_with(&self.client, &self.info.name, &self.options, conversation).await
    }
}
