/*!
 * # codescribe - prompt-driven source-to-source translation
 *
 * Drives a text-generation backend with engineered prompts to translate
 * source files (Fortran to C++ by default) and to answer questions about a
 * codebase.
 *
 * ## Features
 *
 * - Seed prompt templates (TOML `[[chat]]` or JSON) reused across a batch
 * - Comment-filtered source injection plus optional hand-written drafts
 * - Resumable batches: units whose output exists are skipped
 * - Dual-artifact extraction from tagged responses, with a whole-response
 *   fallback
 * - Offline prompt generation (prompt dumps without any backend)
 * - Single-shot multi-file inspection queries
 * - Backends:
 *   - Local checkpoint directories served by a local inference server
 *   - OpenAI API
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `app_controller`: Run orchestration for the CLI
 * - `translation`: Prompt building, extraction, batch and inspection
 * - `providers`: Generation backends
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{ProviderError, ScribeError};
pub use providers::{Backend, ModelBackend};
pub use translation::{BatchTranslator, Inspector, PromptTemplate, ResponseExtractor, TranslationUnit};
