/*!
 * Tagged-output extraction.
 *
 * A generated response carries up to two artifacts, each wrapped in its own
 * tag pair. The primary artifact falls back to the whole response when its
 * tag is missing; the secondary one is simply absent.
 */

use regex::Regex;
use std::path::Path;

use crate::errors::{ScribeError, ScribeResult};
use crate::file_utils::FileManager;

/// Default tag around the translated implementation
pub const DEFAULT_PRIMARY_TAG: &str = "csource";

/// Default tag around the generated interface
pub const DEFAULT_SECONDARY_TAG: &str = "fsource";

/// Artifacts parsed out of one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Captured primary block, or the whole response
    pub primary: String,
    /// Captured secondary block, if the response had one
    pub secondary: Option<String>,
}

impl ExtractionResult {
    /// Write the primary artifact, and the secondary one only when present.
    ///
    /// Returns whether the secondary artifact was written.
    pub fn write(&self, primary_path: &Path, secondary_path: &Path) -> ScribeResult<bool> {
        FileManager::write_to_file(primary_path, &self.primary)?;
        match &self.secondary {
            Some(secondary) => {
                FileManager::write_to_file(secondary_path, secondary)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Splits raw backend text into primary and secondary artifacts
#[derive(Debug, Clone)]
pub struct ResponseExtractor {
    primary: Regex,
    secondary: Regex,
}

impl ResponseExtractor {
    pub fn new(primary_tag: &str, secondary_tag: &str) -> ScribeResult<Self> {
        Ok(Self {
            primary: tag_pattern(primary_tag)?,
            secondary: tag_pattern(secondary_tag)?,
        })
    }

    /// Extractor for the `<csource>` / `<fsource>` convention
    pub fn with_default_tags() -> ScribeResult<Self> {
        Self::new(DEFAULT_PRIMARY_TAG, DEFAULT_SECONDARY_TAG)
    }

    pub fn extract(&self, response: &str) -> ExtractionResult {
        let primary = capture(&self.primary, response).unwrap_or(response);
        let secondary = capture(&self.secondary, response);

        ExtractionResult {
            primary: primary.to_string(),
            secondary: secondary.map(str::to_string),
        }
    }
}

/// Non-greedy, multi-line `<tag>(.*?)</tag>`
fn tag_pattern(tag: &str) -> ScribeResult<Regex> {
    if tag.is_empty() {
        return Err(ScribeError::Configuration("Output tag name must not be empty".to_string()));
    }
    let tag = regex::escape(tag);
    Regex::new(&format!(r"(?s)<{tag}>(.*?)</{tag}>"))
        .map_err(|e| ScribeError::Configuration(format!("Invalid output tag: {}", e)))
}

fn capture<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
