/*!
 * Seed prompt template.
 *
 * The template is loaded once per run and never mutated. Every translation
 * unit works on its own copy, so injected source text can never leak into
 * the next unit's prompt.
 */

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::{ScribeError, ScribeResult};
use crate::file_utils::FileManager;

use super::conversation::{ChatConversation, ChatMessage};

/// TOML layout: an array of `[[chat]]` tables
#[derive(Debug, Deserialize)]
struct TomlTemplate {
    chat: Vec<ChatMessage>,
}

/// Immutable base conversation shared by all units of a run
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    base: ChatConversation,
}

impl PromptTemplate {
    pub fn new(base: ChatConversation) -> Self {
        Self { base }
    }

    /// Load a template from disk.
    ///
    /// `.json` files hold a bare array of `{role, content}` records; anything
    /// else is read as TOML with a `[[chat]]` array.
    pub fn load<P: AsRef<Path>>(path: P) -> ScribeResult<Self> {
        let path = path.as_ref();
        let text = FileManager::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&text, path)
        } else {
            Self::from_toml_str(&text, path)
        }
    }

    pub fn from_toml_str(text: &str, origin: &Path) -> ScribeResult<Self> {
        let parsed: TomlTemplate = toml::from_str(text)
            .map_err(|e| malformed(origin, e.to_string()))?;
        Self::from_messages(parsed.chat, origin)
    }

    pub fn from_json_str(text: &str, origin: &Path) -> ScribeResult<Self> {
        let messages: Vec<ChatMessage> = serde_json::from_str(text)
            .map_err(|e| malformed(origin, e.to_string()))?;
        Self::from_messages(messages, origin)
    }

    fn from_messages(messages: Vec<ChatMessage>, origin: &Path) -> ScribeResult<Self> {
        ChatConversation::new(messages)
            .map(Self::new)
            .ok_or_else(|| malformed(origin, "template has no seed message".to_string()))
    }

    /// The unmodified seed content
    pub fn seed(&self) -> &str {
        &self.base.seed().content
    }

    pub fn base(&self) -> &ChatConversation {
        &self.base
    }

    /// A fresh conversation for one unit
    pub fn working_copy(&self) -> ChatConversation {
        self.base.clone()
    }
}

fn malformed(origin: &Path, reason: String) -> ScribeError {
    ScribeError::MalformedTemplate {
        path: PathBuf::from(origin),
        reason,
    }
}
