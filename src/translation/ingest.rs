/*!
 * Source and draft ingestion.
 *
 * Reads a unit's input files and appends them to the working conversation
 * as `<source>` and `<draft>` blocks.
 */

use log::debug;
use std::path::Path;

use crate::errors::ScribeResult;
use crate::file_utils::FileManager;

use super::conversation::ChatConversation;

/// Line prefixes (after trimming and lowercasing) that mark a fixed-form or
/// free-form Fortran comment.
pub const COMMENT_MARKERS: [&str; 3] = ["c", "!!", "!"];

/// Statements that start with the comment letter but are code.
pub const COMMENT_EXCEPTION: &str = "complex";

/// Reads source files, dropping comment lines
pub struct SourceIngestor;

impl SourceIngestor {
    /// Whether a line is treated as a comment
    pub fn is_comment(line: &str) -> bool {
        let folded = line.trim().to_lowercase();
        COMMENT_MARKERS.iter().any(|marker| folded.starts_with(marker))
            && !folded.starts_with(COMMENT_EXCEPTION)
    }

    /// Concatenate the non-comment lines in their original order
    pub fn filter_lines<I, S>(lines: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter(|line| !Self::is_comment(line.as_ref()))
            .fold(String::new(), |mut code, line| {
                code.push_str(line.as_ref());
                code
            })
    }

    /// Wrap filtered code for injection into the seed
    pub fn source_block(code: &str) -> String {
        format!("\n<source>\n{}</source>", code)
    }

    /// Append the filtered source at `path` to the conversation seed.
    ///
    /// Returns whether anything was appended; a file made only of comments
    /// contributes nothing.
    pub fn inject(conversation: &mut ChatConversation, path: &Path) -> ScribeResult<bool> {
        let lines = FileManager::read_lines(path)?;
        let total = lines.len();
        let code = Self::filter_lines(&lines);

        if code.is_empty() {
            debug!("No code left in {:?} after dropping {} comment lines", path, total);
            return Ok(false);
        }

        conversation.append_to_seed(&Self::source_block(&code));
        Ok(true)
    }
}

/// Reads optional hand-written drafts
pub struct DraftIngestor;

impl DraftIngestor {
    pub fn draft_block(draft: &str) -> String {
        format!("\n\n<draft>\n{}</draft>", draft)
    }

    /// Append the draft at `path`, if there is one, to the conversation seed.
    ///
    /// A missing draft is not an error.
    pub fn inject(conversation: &mut ChatConversation, path: Option<&Path>) -> ScribeResult<bool> {
        let Some(path) = path.filter(|p| FileManager::file_exists(p)) else {
            return Ok(false);
        };

        let draft = FileManager::read_to_string(path)?;
        if draft.is_empty() {
            return Ok(false);
        }

        debug!("Including draft {:?}", path);
        conversation.append_to_seed(&Self::draft_block(&draft));
        Ok(true)
    }
}
