/*!
 * Tests for translation cache functionality
 */

use anyhow::Result;
use std::collections::HashMap;
use std::fs;

use mdxlate::translation::cache::{fingerprint, TranslationCache};
use crate::common;

#[test]
fn test_cache_load_withMissingFile_shouldBeEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let cache = TranslationCache::load(temp_dir.path().join("missing.json"));

    assert!(cache.is_empty());
    assert!(!cache.is_dirty());
    Ok(())
}

#[test]
fn test_cache_load_withCorruptFile_shouldStartEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "cache.json", "{\"truncated\": ")?;

    let cache = TranslationCache::load(&path);
    assert!(cache.is_empty());
    Ok(())
}

#[test]
fn test_cache_save_thenLoad_shouldPersistEntries() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("data").join("translation_cache.json");

    let cache = TranslationCache::new();
    cache.upsert("Hello world", "Salom dunyo");
    cache.upsert("Getting Started", "Boshlash");
    assert!(cache.save(&path)?);

    let reloaded = TranslationCache::load(&path);
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get("Hello world").as_deref(), Some("Salom dunyo"));
    assert!(!reloaded.is_dirty());
    Ok(())
}

#[test]
fn test_cache_file_shouldMapFingerprintsToText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("cache.json");

    let cache = TranslationCache::new();
    cache.upsert("Introduction", "Kirish so‘zi");
    cache.save(&path)?;

    let raw = fs::read_to_string(&path)?;
    // Non-ASCII text is stored as is
    assert!(raw.contains("Kirish so‘zi"));

    let entries: HashMap<String, String> = serde_json::from_str(&raw)?;
    assert_eq!(entries.get(&fingerprint("Introduction")).map(String::as_str), Some("Kirish so‘zi"));
    Ok(())
}

#[test]
fn test_cache_save_withDirectoryAtTarget_shouldKeepDirtyFlag() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    // A directory where the file should be makes the final rename fail
    let path = temp_dir.path().join("cache.json");
    fs::create_dir_all(path.join("occupied"))?;

    let cache = TranslationCache::new();
    cache.upsert("text", "matn");
    assert!(cache.save(&path).is_err());
    assert!(cache.is_dirty());
    Ok(())
}

#[tokio::test]
async fn test_cache_concurrentUpserts_shouldKeepOneValuePerText() {
    let cache = TranslationCache::new();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.upsert("same text", &format!("value {}", i)) })
        })
        .collect();

    let mut stored = Vec::new();
    for task in tasks {
        stored.push(task.await.unwrap());
    }

    assert_eq!(cache.len(), 1);
    let winner = cache.get("same text").unwrap();
    assert!(stored.iter().all(|value| *value == winner));
}
