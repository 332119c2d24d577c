use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles loading, validating and saving the run configuration:
/// which backend to drive, how artifact paths are derived and what the
/// inspection preamble says.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Generation backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Batch translation settings
    #[serde(default)]
    pub translate: TranslateConfig,

    /// Inspection settings
    #[serde(default)]
    pub inspect: InspectConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Backend selection and per-variant parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    /// Backend selector: a checkpoint directory or a hosted provider name.
    /// No selector means prompts are only built (and optionally saved).
    #[serde(default)]
    pub model: Option<String>,

    /// Local inference server used to serve checkpoint directories
    #[serde(default = "default_local_endpoint")]
    pub local_endpoint: String,

    /// Name under which the local server knows the checkpoint.
    /// Defaults to the checkpoint directory name.
    #[serde(default)]
    pub served_model: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub hosted: HostedConfig,

    #[serde(default)]
    pub local: LocalCheckpointConfig,

    #[serde(default)]
    pub large_local: LargeLocalConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: None,
            local_endpoint: default_local_endpoint(),
            served_model: None,
            timeout_secs: default_timeout_secs(),
            hosted: HostedConfig::default(),
            local: LocalCheckpointConfig::default(),
            large_local: LargeLocalConfig::default(),
        }
    }
}

/// Hosted (OpenAI) backend parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HostedConfig {
    /// Model identifier
    #[serde(default = "default_hosted_model")]
    pub model: String,

    /// API key. Empty means the OPENAI_API_KEY environment variable is used.
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_hosted_endpoint")]
    pub endpoint: String,

    /// Maximum number of tokens in the completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Number of candidate completions; the first one is used
    #[serde(default = "default_candidates")]
    pub n: u32,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            model: default_hosted_model(),
            api_key: String::new(),
            endpoint: default_hosted_endpoint(),
            max_tokens: default_max_tokens(),
            n: default_candidates(),
        }
    }
}

/// Parameters for a fine-tuned checkpoint directory
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalCheckpointConfig {
    /// Maximum number of newly generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_new_tokens: u32,

    /// Generation batch size
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Padding token id used when the checkpoint does not declare one
    #[serde(default = "default_pad_token_id")]
    pub pad_token_id: u32,
}

impl Default for LocalCheckpointConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: default_max_tokens(),
            batch_size: default_batch_size(),
            pad_token_id: default_pad_token_id(),
        }
    }
}

/// Parameters for a raw large-model checkpoint (params.json + tokenizer.model)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LargeLocalConfig {
    /// Maximum sequence length (prompt plus generation)
    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: u32,

    /// Maximum batch size
    #[serde(default = "default_batch_size")]
    pub max_batch_size: u32,

    /// Sampling temperature
    #[serde(default = "default_large_temperature")]
    pub temperature: f32,

    /// Nucleus sampling probability mass
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Maximum generation length; unset lets the model run to its limit
    #[serde(default)]
    pub max_gen_len: Option<u32>,
}

impl Default for LargeLocalConfig {
    fn default() -> Self {
        Self {
            max_seq_len: default_max_seq_len(),
            max_batch_size: default_batch_size(),
            temperature: default_large_temperature(),
            top_p: default_top_p(),
            max_gen_len: None,
        }
    }
}

/// How translation units are derived from source files
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslateConfig {
    /// Extensions picked up when a directory is given as input
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Suffix of the primary artifact (replaces the source extension)
    #[serde(default = "default_primary_suffix")]
    pub primary_suffix: String,

    /// Suffix of the secondary artifact
    #[serde(default = "default_secondary_suffix")]
    pub secondary_suffix: String,

    /// Suffix of an optional hand-written draft
    #[serde(default = "default_draft_suffix")]
    pub draft_suffix: String,

    /// Suffix of the per-unit prompt dump
    #[serde(default = "default_prompt_suffix")]
    pub prompt_suffix: String,

    /// Tag wrapping the primary artifact in the model response
    #[serde(default = "default_primary_tag")]
    pub primary_tag: String,

    /// Tag wrapping the secondary artifact in the model response
    #[serde(default = "default_secondary_tag")]
    pub secondary_tag: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_source_extensions(),
            primary_suffix: default_primary_suffix(),
            secondary_suffix: default_secondary_suffix(),
            draft_suffix: default_draft_suffix(),
            prompt_suffix: default_prompt_suffix(),
            primary_tag: default_primary_tag(),
            secondary_tag: default_secondary_tag(),
        }
    }
}

/// Inspection query settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InspectConfig {
    /// Instructional text placed before the file blocks
    #[serde(default = "default_preamble")]
    pub preamble: String,

    /// Where the aggregated prompt is saved when prompt saving is on
    #[serde(default = "default_inspect_prompt_file")]
    pub prompt_file: String,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            preamble: default_preamble(),
            prompt_file: default_inspect_prompt_file(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_local_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_hosted_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_hosted_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_candidates() -> u32 {
    1
}

fn default_batch_size() -> u32 {
    8
}

fn default_pad_token_id() -> u32 {
    50256
}

fn default_max_seq_len() -> u32 {
    4096
}

fn default_large_temperature() -> f32 {
    0.5
}

fn default_top_p() -> f32 {
    0.95
}

fn default_source_extensions() -> Vec<String> {
    ["f", "f77", "f90", "F", "F90"].iter().map(|ext| ext.to_string()).collect()
}

fn default_primary_suffix() -> String {
    ".cpp".to_string()
}

fn default_secondary_suffix() -> String {
    "_fi.F90".to_string()
}

fn default_draft_suffix() -> String {
    ".draft.cpp".to_string()
}

fn default_prompt_suffix() -> String {
    ".json".to_string()
}

fn default_primary_tag() -> String {
    "csource".to_string()
}

fn default_secondary_tag() -> String {
    "fsource".to_string()
}

fn default_inspect_prompt_file() -> String {
    "scribe.json".to_string()
}

fn default_preamble() -> String {
    concat!(
        "I will give you source code from a set of files that\n",
        "belong to a scientific computing codebase. I want you\n",
        "to understand the source code and answer a query that\n",
        "follows. Source code for each will be separated using\n",
        "elements <filename> ... </filename>. Additional\n",
        "information related to the project structure may also be\n",
        "provided within <index> ... </index>. This information will\n",
        "contain an index of subroutines, functions, and modules contained\n",
        "in each file. Note that you will find subroutines and functions\n",
        "repeat along nodes in the directory tree. This maybe due to a directory-based\n",
        "inheritance design implemented by the project. If the index element is not\n",
        "present, then you may ignore it. The query prompt will be provided at then end\n",
        "using elements <query> ... </query>.\n\n",
    )
    .to_string()
}

impl Config {
    /// Load the configuration at `path`, writing a default one if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let translate = &self.translate;
        if translate.primary_tag.is_empty() || translate.secondary_tag.is_empty() {
            return Err(anyhow!("Output tag names must not be empty"));
        }
        if translate.primary_tag == translate.secondary_tag {
            return Err(anyhow!(
                "Primary and secondary output tags must differ (both are '{}')",
                translate.primary_tag
            ));
        }

        let suffixes = [
            &translate.primary_suffix,
            &translate.secondary_suffix,
            &translate.draft_suffix,
            &translate.prompt_suffix,
        ];
        if suffixes.iter().any(|s| s.is_empty()) {
            return Err(anyhow!("Artifact suffixes must not be empty"));
        }
        for (i, a) in suffixes.iter().enumerate() {
            if suffixes[i + 1..].contains(a) {
                return Err(anyhow!("Artifact suffix '{}' is used for more than one artifact", a));
            }
        }

        if self.backend.hosted.n == 0 {
            return Err(anyhow!("Hosted backend must request at least one candidate"));
        }

        let large = &self.backend.large_local;
        if !(0.0..=1.0).contains(&large.top_p) {
            return Err(anyhow!("top_p must be within [0, 1], got {}", large.top_p));
        }

        Ok(())
    }
}
