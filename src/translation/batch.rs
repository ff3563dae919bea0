/*!
 * Batch translation processing.
 *
 * `BatchTranslator` turns an ordered list of texts into a same-length,
 * same-order list of resolved texts. Blank texts pass through, cached texts
 * come from the cache, and the rest are sent to the backend either one call
 * per text or joined with a separator sentinel. A joined answer that does not
 * split back into the expected number of parts is discarded and its texts are
 * retried one by one. Anything that still fails resolves to its original text.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::collections::HashMap;

use crate::app_config::{BatchMode, TranslationConfig};

use super::cache::TranslationCache;
use super::core::TranslationService;

/// Sentinel marking the boundary between joined texts
pub const SENTINEL: &str = "§§§";

/// Separator placed between joined texts
pub const SEPARATOR: &str = " §§§ ";

/// Where a resolved text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedFrom {
    /// Found in the translation cache
    Cache,
    /// Translated by the backend during this call
    Provider,
    /// Translation failed; the original text is kept
    Fallback,
    /// Blank text, returned as is
    Passthrough,
}

/// A text after translation was attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedText {
    pub text: String,
    pub source: ResolvedFrom,
}

impl ResolvedText {
    fn new(text: impl Into<String>, source: ResolvedFrom) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    /// Whether the text is an actual translation
    pub fn is_translated(&self) -> bool {
        matches!(self.source, ResolvedFrom::Cache | ResolvedFrom::Provider)
    }
}

/// Group `texts` into joined requests.
///
/// Each batch holds at most `max_items` texts and, unless it holds a single
/// text, at most `max_chars` characters including separators. Texts containing
/// the sentinel always get a batch of their own.
pub fn plan_batches(texts: &[String], max_items: usize, max_chars: usize) -> Vec<Vec<usize>> {
    let max_items = max_items.max(1);
    let separator_chars = SEPARATOR.chars().count();

    let mut batches = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_chars = 0;

    for (index, text) in texts.iter().enumerate() {
        if text.contains(SENTINEL) {
            batches.push(vec![index]);
            continue;
        }

        let chars = text.chars().count();
        let added = if current.is_empty() { chars } else { chars + separator_chars };
        if !current.is_empty() && (current.len() >= max_items || current_chars + added > max_chars) {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        current_chars += if current.is_empty() { chars } else { chars + separator_chars };
        current.push(index);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Batch translator for resolving lists of texts
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    /// The translation service to use
    service: TranslationService,
    cache: TranslationCache,
    mode: BatchMode,
    max_items: usize,
    max_chars: usize,
    /// Maximum number of requests issued at once by one call
    max_concurrent_requests: usize,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(service: TranslationService, cache: TranslationCache, config: &TranslationConfig) -> Self {
        Self {
            service,
            cache,
            mode: config.batch_mode,
            max_items: config.batch_max_items,
            max_chars: config.batch_max_chars,
            max_concurrent_requests: config.concurrent_requests.max(1),
        }
    }

    pub fn with_mode(mut self, mode: BatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Resolve every text in `texts`, keeping length and order
    pub async fn translate_texts(&self, texts: &[String]) -> Vec<ResolvedText> {
        let mut resolved: Vec<ResolvedText> = texts
            .iter()
            .map(|text| ResolvedText::new(text.clone(), ResolvedFrom::Passthrough))
            .collect();

        // Distinct uncached texts and the positions waiting for each
        let mut pending: Vec<String> = Vec::new();
        let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();

        for (index, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                continue;
            }
            if let Some(cached) = self.cache.get(text) {
                resolved[index] = ResolvedText::new(cached, ResolvedFrom::Cache);
                continue;
            }
            let waiting = positions.entry(text.as_str()).or_default();
            if waiting.is_empty() {
                pending.push(text.clone());
            }
            waiting.push(index);
        }

        if pending.is_empty() {
            return resolved;
        }

        debug!(
            "{} of {} texts need the backend ({} mode)",
            pending.len(),
            texts.len(),
            self.mode
        );

        let results = match self.mode {
            BatchMode::Single => self.translate_each(&pending).await,
            BatchMode::Joined => self.translate_joined(&pending).await,
        };

        for (text, result) in pending.iter().zip(results) {
            if let Some(waiting) = positions.get(text.as_str()) {
                for &index in waiting {
                    resolved[index] = result.clone();
                }
            }
        }

        resolved
    }

    /// One call per text
    async fn translate_each(&self, texts: &[String]) -> Vec<ResolvedText> {
        let mut results = stream::iter(texts.iter().enumerate())
            .map(|(index, text)| async move { (index, self.translate_one(text).await) })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Joined calls per planned batch
    async fn translate_joined(&self, texts: &[String]) -> Vec<ResolvedText> {
        let batches = plan_batches(texts, self.max_items, self.max_chars);
        debug!("Planned {} joined requests for {} texts", batches.len(), texts.len());

        let mut results = stream::iter(batches)
            .map(|batch| async move {
                let batch_texts: Vec<&str> = batch.iter().map(|&index| texts[index].as_str()).collect();
                let resolved = self.translate_batch(&batch_texts).await;
                batch.into_iter().zip(resolved).collect::<Vec<_>>()
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Translate one batch with a joined call, falling back to single calls
    /// when the answer does not split into one part per text
    async fn translate_batch(&self, texts: &[&str]) -> Vec<ResolvedText> {
        if texts.len() == 1 {
            return vec![self.translate_one(texts[0]).await];
        }

        let joined = texts.join(SEPARATOR);
        match self.service.call(&joined).await {
            Ok(response) => {
                let parts: Vec<&str> = response.split(SENTINEL).map(str::trim).collect();
                if parts.len() == texts.len() && parts.iter().all(|part| !part.is_empty()) {
                    return texts
                        .iter()
                        .zip(parts)
                        .map(|(text, part)| ResolvedText::new(self.cache.upsert(text, part), ResolvedFrom::Provider))
                        .collect();
                }

                warn!(
                    "Joined answer split into {} parts for {} texts, retrying individually",
                    parts.len(),
                    texts.len()
                );

                let owned: Vec<String> = texts.iter().map(|text| text.to_string()).collect();
                self.translate_each(&owned).await
            }
            Err(e) => {
                warn!("Joined request for {} texts failed, keeping originals: {}", texts.len(), e);
                texts
                    .iter()
                    .map(|text| ResolvedText::new(*text, ResolvedFrom::Fallback))
                    .collect()
            }
        }
    }

    /// Translate one text with its own call
    async fn translate_one(&self, text: &str) -> ResolvedText {
        match self.service.call(text).await {
            Ok(translated) => ResolvedText::new(self.cache.upsert(text, &translated), ResolvedFrom::Provider),
            Err(e) => {
                warn!("Keeping original text after failed translation: {}", e);
                ResolvedText::new(text, ResolvedFrom::Fallback)
            }
        }
    }
}
