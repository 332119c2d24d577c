/*!
 * Chat conversation model.
 *
 * A conversation is the ordered list of role/content messages handed to a
 * backend. It is never empty: the last message is the seed turn that
 * per-unit content gets appended to.
 */

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{ScribeError, ScribeResult};
use crate::file_utils::FileManager;

/// A single chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

/// Ordered, non-empty sequence of chat messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChatConversation {
    messages: Vec<ChatMessage>,
}

impl ChatConversation {
    /// Build a conversation, returning `None` when there is no seed message
    pub fn new(messages: Vec<ChatMessage>) -> Option<Self> {
        if messages.is_empty() {
            None
        } else {
            Some(Self { messages })
        }
    }

    /// A conversation made of one user turn
    pub fn single_user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(content)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true for a constructed conversation
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The trailing message that per-unit content is appended to
    pub fn seed(&self) -> &ChatMessage {
        // Construction guarantees at least one message.
        &self.messages[self.messages.len() - 1]
    }

    /// Append text to the seed message
    pub fn append_to_seed(&mut self, text: &str) {
        let last = self.messages.len() - 1;
        self.messages[last].content.push_str(text);
    }

    /// Render as a pretty JSON array with four-space indentation
    pub fn to_pretty_json(&self) -> ScribeResult<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| ScribeError::Configuration(format!("Failed to serialize prompt: {}", e)))?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Persist the conversation as a prompt dump
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ScribeResult<()> {
        let json = self.to_pretty_json()?;
        FileManager::write_to_file(path.as_ref(), &json)
    }
}
