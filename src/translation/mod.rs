/*!
 * Prompt-driven source translation.
 *
 * - `conversation`: chat message model and prompt dumps
 * - `template`: the immutable seed template and per-unit working copies
 * - `ingest`: source (comment-filtered) and draft injection
 * - `extract`: splitting a response into primary/secondary artifacts
 * - `batch`: the resumable per-unit translation loop
 * - `inspect`: single-shot multi-file queries
 */

// Re-export main types for easier usage
pub use self::batch::{BatchOptions, BatchSummary, BatchTranslator, TranslationUnit, UnitOutcome};
pub use self::conversation::{ChatConversation, ChatMessage};
pub use self::extract::{ExtractionResult, ResponseExtractor};
pub use self::ingest::{DraftIngestor, SourceIngestor};
pub use self::inspect::{InspectionRequest, Inspector};
pub use self::template::PromptTemplate;

// Submodules
pub mod batch;
pub mod conversation;
pub mod extract;
pub mod ingest;
pub mod inspect;
pub mod template;
