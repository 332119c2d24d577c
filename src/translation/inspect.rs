/*!
 * Multi-file inspection queries.
 *
 * Aggregates several files and a free-form question into one user message
 * and asks the backend once. The answer is returned as-is.
 */

use log::info;
use std::path::{Path, PathBuf};

use crate::errors::ScribeResult;
use crate::file_utils::FileManager;
use crate::providers::ModelBackend;

use super::conversation::ChatConversation;

/// Files to show the model and the question to ask about them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionRequest {
    pub files: Vec<PathBuf>,
    pub query: String,
}

impl InspectionRequest {
    pub fn new(files: Vec<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            files,
            query: query.into(),
        }
    }
}

/// `<label>content</label>` block for one file
pub fn file_block(label: &str, content: &str) -> String {
    format!("\n<{label}>{content}</{label}>\n")
}

/// Trailing `<query>` block
pub fn query_block(query: &str) -> String {
    format!("\n<query>\n{query}\n</query>\n")
}

/// Assemble the single user message: preamble, one block per non-empty
/// file in order, then the query.
pub fn aggregate<S: AsRef<str>>(preamble: &str, files: &[(S, S)], query: &str) -> String {
    let mut content = String::from(preamble);
    for (label, text) in files {
        if !text.as_ref().is_empty() {
            content.push_str(&file_block(label.as_ref(), text.as_ref()));
        }
    }
    content.push_str(&query_block(query));
    content
}

/// Single-shot inspection over a set of files
pub struct Inspector {
    preamble: String,
    backend: Option<Box<dyn ModelBackend>>,
    prompt_dump: Option<PathBuf>,
}

impl Inspector {
    pub fn new(preamble: impl Into<String>, backend: Option<Box<dyn ModelBackend>>) -> Self {
        Self {
            preamble: preamble.into(),
            backend,
            prompt_dump: None,
        }
    }

    /// Save the aggregated prompt to `path` on every inspection
    pub fn with_prompt_dump(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt_dump = Some(path.into());
        self
    }

    pub fn build_prompt(&self, request: &InspectionRequest) -> ScribeResult<ChatConversation> {
        let files = request
            .files
            .iter()
            .map(|path| Ok((label(path), FileManager::read_to_string(path)?)))
            .collect::<ScribeResult<Vec<(String, String)>>>()?;

        Ok(ChatConversation::single_user(aggregate(&self.preamble, &files, &request.query)))
    }

    /// Build, optionally save, and ask.
    ///
    /// Returns the raw backend answer, or `None` when no backend is set.
    pub async fn inspect(&self, request: &InspectionRequest) -> ScribeResult<Option<String>> {
        let prompt = self.build_prompt(request)?;

        if let Some(dump) = &self.prompt_dump {
            prompt.save(dump)?;
            info!("Saving prompts to {:?}", dump);
        }

        match &self.backend {
            Some(backend) => Ok(Some(backend.chat(&prompt).await?)),
            None => Ok(None),
        }
    }
}

fn label(path: &Path) -> String {
    path.display().to_string()
}
