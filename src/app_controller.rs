use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::document::{Document, Segmenter};
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::providers::tilmoch::Tilmoch;
use crate::providers::Provider;
use crate::translation::{AdmissionGate, BatchTranslator, ResolvedFrom, StatsStore, TranslationCache, TranslationService};

// @module: Pipeline driver for documentation trees

/// Which source files get (re)translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetranslateMode {
    /// Only files without an output
    #[default]
    Missing,
    /// Every file
    Force,
    /// Files without an output or modified after it
    Incremental,
}

impl RetranslateMode {
    /// `--force` wins over `--incremental`
    pub fn from_flags(force: bool, incremental: bool) -> Self {
        if force {
            Self::Force
        } else if incremental {
            Self::Incremental
        } else {
            Self::Missing
        }
    }
}

/// A source file scheduled for translation and where its output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Files to process and how many were skipped
#[derive(Debug, Clone, Default)]
pub struct FilePlan {
    pub jobs: Vec<FileJob>,
    pub skipped: usize,
}

/// Outcome of translating one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Translation units found in the document
    pub units: usize,
    /// Units that received a translation (cached or fresh)
    pub translated: usize,
    /// Units served from the cache
    pub from_cache: usize,
    /// Units kept in the source language after a failed call
    pub left_as_source: usize,
}

/// Tally of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
    /// Estimated cost of this run in USD
    pub cost: f64,
    pub reports: Vec<FileReport>,
    pub failures: Vec<(PathBuf, AppError)>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn message(&self) -> String {
        format!(
            "Translation completed: {} processed, {} succeeded, {} failed, {} skipped in {} (estimated cost ${:.4})",
            self.processed,
            self.succeeded,
            self.failed,
            self.skipped,
            Controller::format_duration(self.elapsed),
            self.cost
        )
    }
}

/// Main application controller for documentation translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    segmenter: Segmenter,
    translator: BatchTranslator,
    cache: TranslationCache,
    stats: StatsStore,
    show_progress: bool,
}

impl Controller {
    // @method: Create a controller talking to the configured Tilmoch endpoint
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let api_key = config.translation.resolve_api_key()?;
        let provider = Tilmoch::new(
            api_key,
            config.translation.endpoint.clone(),
            Duration::from_secs(config.translation.timeout_secs),
        );
        Self::with_provider(config, Arc::new(provider))
    }

    // @method: Create a controller over any backend
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Result<Self> {
        config.validate()?;

        let cache = TranslationCache::load(&config.paths.cache_file);
        let stats = StatsStore::load(&config.paths.stats_file, config.translation.pricing.clone());
        let gate = AdmissionGate::new(config.translation.concurrent_requests);

        let service = TranslationService::new(provider, gate, stats.clone(), &config);
        let translator = BatchTranslator::new(service, cache.clone(), &config.translation);
        let segmenter = Segmenter::new(config.segmenter.clone());

        info!(
            "Translating {} -> {} with {} ({} mode, {} concurrent requests, {} cached entries)",
            config.source_language,
            config.target_language,
            translator.service().provider_name(),
            config.translation.batch_mode,
            config.translation.concurrent_requests,
            cache.len()
        );

        Ok(Self {
            config,
            segmenter,
            translator,
            cache,
            stats,
            show_progress: true,
        })
    }

    /// Hide the progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    pub fn gate(&self) -> &AdmissionGate {
        self.translator.service().gate()
    }

    /// Decide which files under `source_dir` need translating
    pub fn plan_files(&self, source_dir: &Path, output_dir: &Path, mode: RetranslateMode) -> Result<FilePlan> {
        if !FileManager::dir_exists(source_dir) {
            return Err(anyhow!("Source directory does not exist: {:?}", source_dir));
        }

        // Outputs nested inside the source tree are not sources
        let output_root = output_dir.canonicalize().ok();

        let mut plan = FilePlan::default();
        for source in FileManager::find_files(source_dir, &self.config.paths.extensions)? {
            if let Some(root) = &output_root {
                if source.canonicalize().is_ok_and(|path| path.starts_with(root)) {
                    continue;
                }
            }

            let output = FileManager::mirror_output_path(&source, source_dir, output_dir);
            let scheduled = match mode {
                RetranslateMode::Force => true,
                RetranslateMode::Missing => !output.exists(),
                RetranslateMode::Incremental => FileManager::is_newer(&source, &output)?,
            };

            if scheduled {
                plan.jobs.push(FileJob { source, output });
            } else {
                debug!("Skipping {:?}, output is up to date", source);
                plan.skipped += 1;
            }
        }

        Ok(plan)
    }

    /// Translate one file and write its output.
    ///
    /// Nothing is written unless every unit resolved and the document
    /// reassembled cleanly.
    pub async fn translate_file(&self, source: &Path, output: &Path) -> Result<FileReport> {
        let document = Document::from_file(source)?;
        let segmented = self
            .segmenter
            .segment(&document)
            .with_context(|| format!("Failed to segment {:?}", source))?;

        let resolved = self.translator.translate_texts(&segmented.texts()).await;
        let translations: Vec<String> = resolved.iter().map(|r| r.text.clone()).collect();

        let text = segmented
            .reconcile(&translations)
            .with_context(|| format!("Failed to reassemble {:?}", source))?;
        FileManager::write_to_file(output, &text)?;

        if let Err(e) = self.cache.save(&self.config.paths.cache_file) {
            warn!("Failed to checkpoint translation cache: {}", e);
        }

        let report = FileReport {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            units: resolved.len(),
            translated: resolved.iter().filter(|r| r.is_translated()).count(),
            from_cache: resolved.iter().filter(|r| r.source == ResolvedFrom::Cache).count(),
            left_as_source: resolved.iter().filter(|r| r.source == ResolvedFrom::Fallback).count(),
        };

        info!(
            "{}: {} units, {} translated ({} cached), {} left as source",
            source.display(),
            report.units,
            report.translated,
            report.from_cache,
            report.left_as_source
        );

        Ok(report)
    }

    /// Translate every scheduled file under `source_dir` into `output_dir`
    pub async fn run(&self, source_dir: &Path, output_dir: &Path, mode: RetranslateMode) -> Result<RunSummary> {
        // Start timing the process
        let start_time = Instant::now();

        let plan = self.plan_files(source_dir, output_dir, mode)?;
        info!(
            "Found {} files to translate in {:?} ({} skipped)",
            plan.jobs.len(),
            source_dir,
            plan.skipped
        );

        let progress = if self.show_progress {
            ProgressBar::new(plan.jobs.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(template_result.progress_chars("█▓▒░"));
        progress.set_message("Translating");

        let outcomes = stream::iter(plan.jobs)
            .map(|job| {
                let progress = progress.clone();
                async move {
                    let result = self.translate_file(&job.source, &job.output).await;
                    if let Some(name) = job.source.file_name() {
                        progress.set_message(name.to_string_lossy().to_string());
                    }
                    progress.inc(1);
                    (job, result)
                }
            })
            .buffer_unordered(self.config.translation.concurrent_files.max(1))
            .collect::<Vec<_>>()
            .await;

        progress.finish_with_message("Done");

        let mut summary = RunSummary {
            skipped: plan.skipped,
            ..RunSummary::default()
        };

        for (job, result) in outcomes {
            summary.processed += 1;
            match result {
                Ok(report) => {
                    summary.succeeded += 1;
                    summary.reports.push(report);
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", job.source.display(), e);
                    summary.failed += 1;
                    summary.failures.push((job.source, AppError::from_file_failure(e)));
                }
            }
        }
        summary.reports.sort_by(|a, b| a.source.cmp(&b.source));
        summary.failures.sort_by(|a, b| a.0.cmp(&b.0));

        if let Err(e) = self.cache.save(&self.config.paths.cache_file) {
            error!("Failed to save translation cache: {}", e);
        }
        if let Err(e) = self.stats.save(&self.config.paths.stats_file) {
            error!("Failed to save run statistics: {}", e);
        }

        summary.elapsed = start_time.elapsed();
        summary.cost = self.stats.session().total_cost;
        info!("{}", summary.message());

        Ok(summary)
    }

    /// Format a duration for display
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
