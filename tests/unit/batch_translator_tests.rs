/*!
 * Tests for batching, de-duplication and fallback
 */

use std::sync::Arc;
use std::time::Duration;

use mdxlate::app_config::{BatchMode, Config, PricingConfig};
use mdxlate::providers::mock::MockProvider;
use mdxlate::translation::{
    AdmissionGate, BatchTranslator, ResolvedFrom, StatsStore, TranslationCache, TranslationService,
};

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn expected(text: &str) -> String {
    MockProvider::expected_translation(text, "uzn_Latn")
}

fn translator_with(provider: &MockProvider, config: &Config, cache: TranslationCache) -> BatchTranslator {
    let service = TranslationService::new(
        Arc::new(provider.clone()),
        AdmissionGate::new(config.translation.concurrent_requests),
        StatsStore::new(PricingConfig::default()),
        config,
    )
    .with_rate_limit_delay(Duration::ZERO);
    BatchTranslator::new(service, cache, &config.translation)
}

fn translator(provider: &MockProvider, mode: BatchMode) -> BatchTranslator {
    let mut config = Config::default();
    config.translation.batch_mode = mode;
    translator_with(provider, &config, TranslationCache::new())
}

#[tokio::test]
async fn test_translate_texts_joined_shouldUseOneCallAndKeepOrder() {
    let provider = MockProvider::working();
    let translator = translator(&provider, BatchMode::Joined);
    let input = texts(&["First sentence", "Second sentence", "Third sentence"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(provider.call_count(), 1);
    assert_eq!(provider.requests(), vec!["First sentence §§§ Second sentence §§§ Third sentence".to_string()]);
    assert_eq!(resolved.len(), 3);
    for (text, result) in input.iter().zip(&resolved) {
        assert_eq!(result.text, expected(text));
        assert_eq!(result.source, ResolvedFrom::Provider);
    }
}

#[tokio::test]
async fn test_translate_texts_single_shouldUseOneCallPerText() {
    let provider = MockProvider::working();
    let translator = translator(&provider, BatchMode::Single);
    let input = texts(&["First sentence", "Second sentence", "Third sentence"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(provider.call_count(), 3);
    let outputs: Vec<String> = resolved.into_iter().map(|r| r.text).collect();
    assert_eq!(outputs, input.iter().map(|t| expected(t)).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_translate_texts_withMergedSeparators_shouldRetryEachText() {
    let provider = MockProvider::merging_separators();
    let translator = translator(&provider, BatchMode::Joined);
    let input = texts(&["Alpha text", "Beta text", "Gamma text"]);

    let resolved = translator.translate_texts(&input).await;

    // One discarded joined call, then one call per text
    assert_eq!(provider.call_count(), 4);
    let mut retried = provider.requests()[1..].to_vec();
    retried.sort();
    assert_eq!(retried, input);
    for (text, result) in input.iter().zip(&resolved) {
        assert_eq!(result.text, expected(text));
        assert_eq!(result.source, ResolvedFrom::Provider);
    }
}

#[tokio::test]
async fn test_translate_texts_withFailingProvider_shouldKeepOriginals() {
    let provider = MockProvider::failing();
    let translator = translator(&provider, BatchMode::Joined);
    let input = texts(&["Alpha text", "Beta text"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(resolved.iter().map(|r| r.text.clone()).collect::<Vec<_>>(), input);
    assert!(resolved.iter().all(|r| r.source == ResolvedFrom::Fallback));
    assert!(translator.cache().is_empty());
}

#[tokio::test]
async fn test_translate_texts_withFailedJoinedCall_shouldKeepWholeBatch() {
    let provider = MockProvider::fail_on("broken");
    let translator = translator(&provider, BatchMode::Joined);
    let input = texts(&["A fine text", "A broken text", "Another fine text"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(provider.call_count(), 1);
    assert!(resolved.iter().zip(&input).all(|(r, t)| r.text == *t && r.source == ResolvedFrom::Fallback));
}

#[tokio::test]
async fn test_translate_texts_singleMode_withOneFailure_shouldOnlyKeepThatOriginal() {
    let provider = MockProvider::fail_on("broken");
    let translator = translator(&provider, BatchMode::Single);
    let input = texts(&["A fine text", "A broken text", "Another fine text"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(resolved[0].text, expected("A fine text"));
    assert_eq!(resolved[1].text, "A broken text");
    assert_eq!(resolved[1].source, ResolvedFrom::Fallback);
    assert_eq!(resolved[2].text, expected("Another fine text"));
    assert!(!translator.cache().contains("A broken text"));
    assert!(translator.cache().contains("A fine text"));
}

#[tokio::test]
async fn test_translate_texts_withEmptyAnswer_shouldFallBack() {
    let provider = MockProvider::empty();
    let translator = translator(&provider, BatchMode::Single);

    let resolved = translator.translate_texts(&texts(&["Nothing comes back"])).await;

    assert_eq!(resolved[0].text, "Nothing comes back");
    assert_eq!(resolved[0].source, ResolvedFrom::Fallback);
}

#[tokio::test]
async fn test_translate_texts_withBlankTexts_shouldPassThemThrough() {
    let provider = MockProvider::working();
    let translator = translator(&provider, BatchMode::Joined);
    let input = texts(&["", "   ", "Real text here"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(resolved[0].text, "");
    assert_eq!(resolved[0].source, ResolvedFrom::Passthrough);
    assert_eq!(resolved[1].text, "   ");
    assert_eq!(resolved[2].text, expected("Real text here"));
    assert_eq!(provider.requests(), vec!["Real text here".to_string()]);
}

#[tokio::test]
async fn test_translate_texts_twice_shouldServeSecondFromCache() {
    let provider = MockProvider::working();
    let translator = translator(&provider, BatchMode::Joined);
    let input = texts(&["Cached sentence", "Another cached sentence"]);

    let first = translator.translate_texts(&input).await;
    let second = translator.translate_texts(&input).await;

    assert_eq!(provider.call_count(), 1);
    assert!(second.iter().all(|r| r.source == ResolvedFrom::Cache));
    assert_eq!(
        first.iter().map(|r| &r.text).collect::<Vec<_>>(),
        second.iter().map(|r| &r.text).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_translate_texts_withPersistedCache_shouldNotCallProvider() {
    let temp_dir = crate::common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("cache.json");

    let seeded = TranslationCache::new();
    seeded.upsert("Known sentence", "Ma'lum gap");
    seeded.save(&path).unwrap();

    let provider = MockProvider::working();
    let translator = translator_with(&provider, &Config::default(), TranslationCache::load(&path));
    let resolved = translator.translate_texts(&texts(&["Known sentence"])).await;

    assert_eq!(provider.call_count(), 0);
    assert_eq!(resolved[0].text, "Ma'lum gap");
    assert_eq!(resolved[0].source, ResolvedFrom::Cache);
}

#[tokio::test]
async fn test_translate_texts_withDuplicates_shouldRequestEachTextOnce() {
    let provider = MockProvider::working();
    let translator = translator(&provider, BatchMode::Single);
    let input = texts(&["Same sentence", "Other sentence", "Same sentence", "Same sentence"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(provider.call_count(), 2);
    assert_eq!(resolved[0], resolved[2]);
    assert_eq!(resolved[0], resolved[3]);
    assert_eq!(resolved[1].text, expected("Other sentence"));
}

#[tokio::test]
async fn test_translate_texts_shouldRespectBatchLimits() {
    let provider = MockProvider::working();
    let mut config = Config::default();
    config.translation.batch_max_items = 2;
    let translator = translator_with(&provider, &config, TranslationCache::new());
    let input = texts(&["One text", "Two text", "Three text", "Four text", "Five text"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(provider.call_count(), 3);
    assert_eq!(resolved.len(), 5);
    assert_eq!(resolved[4].text, expected("Five text"));
}

#[tokio::test]
async fn test_translate_texts_withSentinelInText_shouldSendItAlone() {
    let provider = MockProvider::working();
    let translator = translator(&provider, BatchMode::Joined);
    let input = texts(&["Plain one", "Has §§§ inside", "Plain two"]);

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(provider.call_count(), 2);
    let requests = provider.requests();
    assert!(requests.contains(&"Has §§§ inside".to_string()));
    assert!(requests.contains(&"Plain one §§§ Plain two".to_string()));
    assert_eq!(resolved[0].text, expected("Plain one"));
    assert_eq!(resolved[2].text, expected("Plain two"));
}

#[tokio::test]
async fn test_translate_texts_shouldRespectConcurrencyBound() {
    let provider = MockProvider::slow(10);
    let mut config = Config::default();
    config.translation.batch_mode = BatchMode::Single;
    config.translation.concurrent_requests = 3;
    let translator = translator_with(&provider, &config, TranslationCache::new());
    let input: Vec<String> = (0..20).map(|i| format!("Sentence number {}", i)).collect();

    let resolved = translator.translate_texts(&input).await;

    assert_eq!(provider.call_count(), 20);
    assert!(resolved.iter().all(|r| r.source == ResolvedFrom::Provider));
    assert!(provider.max_in_flight() <= 3, "max in flight {}", provider.max_in_flight());
}

#[tokio::test]
async fn test_with_mode_shouldOverrideConfiguredMode() {
    let provider = MockProvider::working();
    let translator = translator(&provider, BatchMode::Joined).with_mode(BatchMode::Single);
    assert_eq!(translator.mode(), BatchMode::Single);

    translator.translate_texts(&texts(&["First sentence", "Second sentence"])).await;
    assert_eq!(provider.call_count(), 2);
}
