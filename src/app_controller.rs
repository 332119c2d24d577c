use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::providers::{Backend, ModelBackend};
use crate::translation::{
    BatchOptions, BatchSummary, BatchTranslator, InspectionRequest, Inspector, PromptTemplate,
    ResponseExtractor, TranslationUnit,
};

// @module: Application controller for translation and inspection runs

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Construct the configured backend, if a selector is set.
    ///
    /// An unresolvable selector fails here, before any unit is touched.
    pub fn build_backend(&self) -> Result<Option<Box<dyn ModelBackend>>> {
        let Some(selector) = self.config.backend.model.as_deref() else {
            return Ok(None);
        };
        info!("Starting neural conversion process");
        let backend = Backend::from_selector(selector, &self.config.backend)?;
        Ok(Some(Box::new(backend)))
    }

    /// Expand inputs into source files.
    ///
    /// Listed files are always used. Directories contribute files with a
    /// configured source extension, minus artifacts when `skip_artifacts`.
    fn expand_sources(&self, inputs: &[PathBuf], skip_artifacts: bool) -> Result<Vec<PathBuf>> {
        let translate = &self.config.translate;
        let artifact_suffixes = [
            &translate.primary_suffix,
            &translate.secondary_suffix,
            &translate.draft_suffix,
            &translate.prompt_suffix,
        ];

        let mut sources = Vec::new();
        for input in inputs {
            if input.is_dir() {
                let found = FileManager::collect_files(std::slice::from_ref(input))?;
                sources.extend(found.into_iter().filter(|path| {
                    let name = path.file_name().unwrap_or_default().to_string_lossy();
                    let has_source_ext = path
                        .extension()
                        .is_some_and(|ext| translate.source_extensions.iter().any(|e| ext == e.as_str()));
                    let is_artifact = artifact_suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()));
                    has_source_ext && !(skip_artifacts && is_artifact)
                }));
            } else {
                sources.push(input.clone());
            }
        }
        Ok(sources)
    }

    /// Derive translation units from the given files and directories.
    ///
    /// Files in directories that are themselves artifacts are left out.
    pub fn collect_units(&self, inputs: &[PathBuf]) -> Result<Vec<TranslationUnit>> {
        let translate = &self.config.translate;
        Ok(self
            .expand_sources(inputs, true)?
            .iter()
            .map(|source| {
                TranslationUnit::for_source(
                    source,
                    &translate.primary_suffix,
                    &translate.secondary_suffix,
                    &translate.draft_suffix,
                    &translate.prompt_suffix,
                )
            })
            .collect())
    }

    /// Run a batch translation over the given inputs
    pub async fn run_translate(
        &self,
        inputs: &[PathBuf],
        seed_prompt: &Path,
        options: BatchOptions,
    ) -> Result<BatchSummary> {
        let start_time = Instant::now();

        let backend = self.build_backend()?;
        if options.save_prompts {
            info!("Saving custom prompts per file");
        }
        if backend.is_none() && !options.save_prompts {
            warn!("No backend configured and prompt saving is off; only skip checks will run");
        }

        let template = PromptTemplate::load(seed_prompt)
            .with_context(|| format!("Failed to load seed prompt {:?}", seed_prompt))?;
        let extractor = ResponseExtractor::new(
            &self.config.translate.primary_tag,
            &self.config.translate.secondary_tag,
        )?;
        let units = self.collect_units(inputs)?;

        let translator = BatchTranslator::new(template, extractor, backend, options);

        let progress_bar = ProgressBar::new(units.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let pb = progress_bar.clone();
        let result = translator
            .translate_all(&units, move |source, index, _total| {
                pb.set_position(index as u64);
                pb.set_message(source.display().to_string());
            })
            .await;

        progress_bar.finish_and_clear();
        let summary = result?;

        info!(
            "Processed {} files in {}: {} translated, {} skipped, {} prompts saved",
            summary.outcomes.len(),
            Self::format_duration(start_time.elapsed()),
            summary.translated(),
            summary.skipped(),
            summary.prompts_saved(),
        );

        Ok(summary)
    }

    /// Ask one question about a set of files and directories
    pub async fn run_inspect(
        &self,
        inputs: &[PathBuf],
        query: &str,
        save_prompts: bool,
    ) -> Result<Option<String>> {
        let backend = self.build_backend()?;
        let files = self.expand_sources(inputs, false)?;
        info!("Inspecting {} files", files.len());

        let mut inspector = Inspector::new(self.config.inspect.preamble.clone(), backend);
        if save_prompts {
            inspector = inspector.with_prompt_dump(&self.config.inspect.prompt_file);
        }

        let answer = inspector.inspect(&InspectionRequest::new(files, query)).await?;
        Ok(answer)
    }

    /// Format a duration in a human-readable way
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_secs = duration.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
