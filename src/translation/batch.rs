/*!
 * Batch translation processing.
 *
 * Walks translation units in order, one at a time. Each unit either resolves
 * to `Skipped` (its primary artifact already exists) or gets a prompt built
 * from the seed template, optionally saved, and optionally sent to the
 * backend whose answer is split into artifacts.
 */

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::errors::{ScribeError, ScribeResult};
use crate::file_utils::FileManager;
use crate::providers::ModelBackend;

use super::conversation::ChatConversation;
use super::extract::ResponseExtractor;
use super::ingest::{DraftIngestor, SourceIngestor};
use super::template::PromptTemplate;

/// One source file and the artifacts derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// File to translate
    pub source: PathBuf,
    /// Primary artifact, always written after generation
    pub primary_output: PathBuf,
    /// Secondary artifact, written only when the response carries one
    pub secondary_output: PathBuf,
    /// Optional draft injected after the source
    pub draft: Option<PathBuf>,
    /// Where the built prompt is saved when prompt saving is on
    pub prompt_dump: Option<PathBuf>,
}

impl TranslationUnit {
    pub fn new(
        source: impl Into<PathBuf>,
        primary_output: impl Into<PathBuf>,
        secondary_output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            primary_output: primary_output.into(),
            secondary_output: secondary_output.into(),
            draft: None,
            prompt_dump: None,
        }
    }

    pub fn with_draft(mut self, draft: impl Into<PathBuf>) -> Self {
        self.draft = Some(draft.into());
        self
    }

    pub fn with_prompt_dump(mut self, prompt_dump: impl Into<PathBuf>) -> Self {
        self.prompt_dump = Some(prompt_dump.into());
        self
    }

    /// Zip five positionally aligned sequences into units
    pub fn from_sequences(
        sources: Vec<PathBuf>,
        primary_outputs: Vec<PathBuf>,
        secondary_outputs: Vec<PathBuf>,
        drafts: Vec<Option<PathBuf>>,
        prompt_dumps: Vec<Option<PathBuf>>,
    ) -> ScribeResult<Vec<Self>> {
        let n = sources.len();
        let lengths = [primary_outputs.len(), secondary_outputs.len(), drafts.len(), prompt_dumps.len()];
        if lengths.iter().any(|&len| len != n) {
            return Err(ScribeError::Configuration(format!(
                "Translation unit sequences differ in length: {} sources vs {:?}",
                n, lengths
            )));
        }

        Ok(sources
            .into_iter()
            .zip(primary_outputs)
            .zip(secondary_outputs)
            .zip(drafts)
            .zip(prompt_dumps)
            .map(|((((source, primary_output), secondary_output), draft), prompt_dump)| Self {
                source,
                primary_output,
                secondary_output,
                draft,
                prompt_dump,
            })
            .collect())
    }

    /// Derive a unit from a source file using sibling-file suffixes
    pub fn for_source(
        source: &Path,
        primary_suffix: &str,
        secondary_suffix: &str,
        draft_suffix: &str,
        prompt_suffix: &str,
    ) -> Self {
        Self::new(
            source,
            FileManager::artifact_path(source, primary_suffix),
            FileManager::artifact_path(source, secondary_suffix),
        )
        .with_draft(FileManager::artifact_path(source, draft_suffix))
        .with_prompt_dump(FileManager::artifact_path(source, prompt_suffix))
    }
}

/// How a unit was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Primary artifact already present
    Skipped,
    /// Prompt saved, no backend configured
    PromptSaved,
    /// Backend answered and artifacts were written
    Translated {
        prompt_saved: bool,
        secondary_written: bool,
    },
    /// Neither a backend nor prompt saving: nothing to do
    NoOp,
}

/// Run-level switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Regenerate units whose primary artifact exists
    pub force: bool,
    /// Save each unit's prompt to its dump path
    pub save_prompts: bool,
}

/// Counts per outcome for a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub outcomes: Vec<UnitOutcome>,
}

impl BatchSummary {
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Skipped))
    }

    pub fn translated(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Translated { .. }))
    }

    pub fn prompts_saved(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::PromptSaved | UnitOutcome::Translated { prompt_saved: true, .. }))
    }

    fn count(&self, predicate: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

/// Batch translator for processing translation units in sequence
pub struct BatchTranslator {
    template: PromptTemplate,
    extractor: ResponseExtractor,
    backend: Option<Box<dyn ModelBackend>>,
    options: BatchOptions,
}

impl BatchTranslator {
    pub fn new(
        template: PromptTemplate,
        extractor: ResponseExtractor,
        backend: Option<Box<dyn ModelBackend>>,
        options: BatchOptions,
    ) -> Self {
        Self {
            template,
            extractor,
            backend,
            options,
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Whether the unit's primary artifact exists and regeneration is not forced
    pub fn is_finished(&self, unit: &TranslationUnit) -> bool {
        !self.options.force && FileManager::file_exists(&unit.primary_output)
    }

    /// Whether a unit needs no work at all.
    ///
    /// A finished unit is still entered when prompt saving is on, but only
    /// its prompt is regenerated.
    pub fn should_skip(&self, unit: &TranslationUnit) -> bool {
        self.is_finished(unit) && !self.options.save_prompts
    }

    /// Seed plus filtered source plus optional draft
    pub fn build_prompt(&self, unit: &TranslationUnit) -> ScribeResult<ChatConversation> {
        let mut prompt = self.template.working_copy();
        SourceIngestor::inject(&mut prompt, &unit.source)?;
        DraftIngestor::inject(&mut prompt, unit.draft.as_deref())?;
        Ok(prompt)
    }

    /// Process a single unit
    pub async fn translate_unit(&self, unit: &TranslationUnit) -> ScribeResult<UnitOutcome> {
        if self.should_skip(unit) {
            debug!("Skipping {:?}, {:?} already exists", unit.source, unit.primary_output);
            return Ok(UnitOutcome::Skipped);
        }

        let prompt = self.build_prompt(unit)?;

        let prompt_saved = if self.options.save_prompts {
            let dump = unit.prompt_dump.as_ref().ok_or_else(|| missing_dump(unit))?;
            prompt.save(dump)?;
            info!("Generated prompt file for LLM consumption {:?}", dump);
            true
        } else {
            false
        };

        if self.is_finished(unit) {
            debug!("Keeping existing {:?}, only the prompt was regenerated", unit.primary_output);
            return Ok(UnitOutcome::PromptSaved);
        }

        let Some(backend) = &self.backend else {
            return Ok(if prompt_saved { UnitOutcome::PromptSaved } else { UnitOutcome::NoOp });
        };

        let response = backend.chat(&prompt).await?;
        let extracted = self.extractor.extract(&response);
        let secondary_written = extracted.write(&unit.primary_output, &unit.secondary_output)?;

        debug!(
            "Wrote {:?}{}",
            unit.primary_output,
            if secondary_written { format!(" and {:?}", unit.secondary_output) } else { String::new() }
        );

        Ok(UnitOutcome::Translated {
            prompt_saved,
            secondary_written,
        })
    }

    /// Process all units in order.
    ///
    /// `progress` receives each unit's source path with its index and the
    /// total before the unit is processed. The first error aborts the batch;
    /// units finished before it keep their artifacts, so a rerun resumes.
    pub async fn translate_all(
        &self,
        units: &[TranslationUnit],
        mut progress: impl FnMut(&Path, usize, usize),
    ) -> ScribeResult<BatchSummary> {
        if self.options.save_prompts {
            if let Some(unit) = units.iter().find(|u| u.prompt_dump.is_none()) {
                return Err(missing_dump(unit));
            }
        }

        let total = units.len();
        let mut summary = BatchSummary::default();

        for (index, unit) in units.iter().enumerate() {
            progress(&unit.source, index, total);
            let outcome = self.translate_unit(unit).await?;
            summary.outcomes.push(outcome);
        }

        Ok(summary)
    }
}

fn missing_dump(unit: &TranslationUnit) -> ScribeError {
    ScribeError::Configuration(format!(
        "Prompt saving requested but no prompt file is set for {:?}",
        unit.source
    ))
}
