/*!
 * End-to-end tests of the documentation pipeline
 */

use anyhow::Result;
use std::fs;

use mdxlate::app_config::BatchMode;
use mdxlate::app_controller::RetranslateMode;
use mdxlate::errors::{AppError, DocumentError};
use mdxlate::providers::mock::MockProvider;
use mdxlate::translation::RunStatistics;
use crate::common::{self, SAMPLE_PAGE, SAMPLE_PAGE_TRANSLATED};

const SETUP_PAGE: &str = "# Setup instructions\n\nRun the installer and follow the prompts.\n";

/// Test a full run over a small tree
#[tokio::test]
async fn test_run_withSmallTree_shouldMirrorTranslatedFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let docs = config.paths.docs_dir.clone();
    let output = config.paths.output_dir.clone();

    common::create_test_file(&docs, "intro.mdx", SAMPLE_PAGE)?;
    common::create_test_file(&docs, "guide/setup.md", SETUP_PAGE)?;
    common::create_test_file(&docs, "notes.txt", "Not documentation at all")?;

    let provider = MockProvider::working();
    let controller = common::test_controller(config.clone(), &provider)?;
    let summary = controller.run(&docs, &output, RetranslateMode::Missing).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 0);
    assert!(!summary.has_failures());

    assert_eq!(fs::read_to_string(output.join("intro.mdx"))?, SAMPLE_PAGE_TRANSLATED);
    assert_eq!(
        fs::read_to_string(output.join("guide/setup.md"))?,
        "# [uzn_Latn] Setup instructions\n\n[uzn_Latn] Run the installer and follow the prompts.\n"
    );
    assert!(!output.join("notes.txt").exists());

    // Sources are untouched
    assert_eq!(fs::read_to_string(docs.join("intro.mdx"))?, SAMPLE_PAGE);

    let intro = summary.reports.iter().find(|r| r.source.ends_with("intro.mdx")).unwrap();
    assert_eq!(intro.units, 4);
    assert_eq!(intro.translated, 4);
    assert_eq!(intro.left_as_source, 0);

    assert!(config.paths.cache_file.exists());
    assert_eq!(controller.cache().len(), 6);

    let stats: RunStatistics = serde_json::from_str(&fs::read_to_string(&config.paths.stats_file)?)?;
    assert_eq!(stats.total_requests as usize, provider.call_count());
    assert!(stats.total_input_tokens > 0);
    assert!(stats.last_updated.is_some());
    assert!(summary.cost > 0.0);

    Ok(())
}

/// A file whose reassembly cannot be trusted is reported and not written
#[tokio::test]
async fn test_run_withReservedCharacters_shouldFailOnlyThatFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let docs = config.paths.docs_dir.clone();
    let output = config.paths.output_dir.clone();

    common::create_test_file(&docs, "good.mdx", SETUP_PAGE)?;
    common::create_test_file(&docs, "bad.mdx", "# Heading text\n\nSneaky \u{E000}7\u{E001} token in prose\n")?;

    let provider = MockProvider::working();
    let controller = common::test_controller(config, &provider)?;
    let summary = controller.run(&docs, &output, RetranslateMode::Missing).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.has_failures());
    assert!(summary.failures[0].0.ends_with("bad.mdx"));
    assert!(matches!(
        summary.failures[0].1,
        AppError::Document(DocumentError::ReservedCharacters { line: 3 })
    ));

    assert!(output.join("good.mdx").exists());
    assert!(!output.join("bad.mdx").exists());
    Ok(())
}

/// Failed backend calls leave the source text in place and still write the file
#[tokio::test]
async fn test_run_withFailingCalls_shouldWriteOriginalText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let docs = config.paths.docs_dir.clone();
    let output = config.paths.output_dir.clone();

    let unreachable = "# Unreachable heading\n\nThis paragraph cannot be translated today.\n";
    common::create_test_file(&docs, "down.mdx", unreachable)?;
    common::create_test_file(&docs, "up.mdx", SETUP_PAGE)?;

    let provider = MockProvider::fail_on("Unreachable");
    let controller = common::test_controller(config.clone(), &provider)?;
    let summary = controller.run(&docs, &output, RetranslateMode::Missing).await?;

    assert_eq!(summary.succeeded, 2);
    assert_eq!(fs::read_to_string(output.join("down.mdx"))?, unreachable);
    assert!(fs::read_to_string(output.join("up.mdx"))?.contains("[uzn_Latn] Setup instructions"));

    let down = summary.reports.iter().find(|r| r.source.ends_with("down.mdx")).unwrap();
    assert_eq!(down.left_as_source, 2);
    assert_eq!(down.translated, 0);

    // Failures are not cached, so the next run asks again
    assert!(!controller.cache().contains("Unreachable heading"));
    Ok(())
}

/// The same text in two files costs one backend call
#[tokio::test]
async fn test_run_withSharedText_shouldTranslateItOnce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.translation.concurrent_files = 1;
    let docs = config.paths.docs_dir.clone();
    let output = config.paths.output_dir.clone();

    let shared = "This sentence appears in both pages.";
    common::create_test_file(&docs, "a.mdx", &format!("# First page title\n\n{}\n", shared))?;
    common::create_test_file(&docs, "b.mdx", &format!("# Second page title\n\n{}\n", shared))?;

    let provider = MockProvider::working();
    let controller = common::test_controller(config, &provider)?;
    let summary = controller.run(&docs, &output, RetranslateMode::Missing).await?;

    assert_eq!(summary.succeeded, 2);
    let asked = provider.requests().iter().filter(|r| r.contains(shared)).count();
    assert_eq!(asked, 1);
    assert_eq!(controller.cache().len(), 3);

    let second = summary.reports.iter().find(|r| r.source.ends_with("b.mdx")).unwrap();
    assert_eq!(second.from_cache, 1);

    let expected = format!("[uzn_Latn] {}", shared);
    assert!(fs::read_to_string(output.join("a.mdx"))?.contains(&expected));
    assert!(fs::read_to_string(output.join("b.mdx"))?.contains(&expected));
    Ok(())
}

/// Concurrent files share one bound on backend calls
#[tokio::test]
async fn test_run_withManyFiles_shouldRespectRequestBound() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::test_config(temp_dir.path());
    config.translation.concurrent_files = 4;
    config.translation.concurrent_requests = 2;
    config.translation.batch_mode = BatchMode::Single;
    let docs = config.paths.docs_dir.clone();
    let output = config.paths.output_dir.clone();

    for i in 0..8 {
        common::create_test_file(
            &docs,
            &format!("page{}.mdx", i),
            &format!("# Page number {} heading\n\nBody paragraph of page number {}.\n", i, i),
        )?;
    }

    let provider = MockProvider::slow(5);
    let controller = common::test_controller(config, &provider)?;
    let summary = controller.run(&docs, &output, RetranslateMode::Missing).await?;

    assert_eq!(summary.succeeded, 8);
    assert_eq!(provider.call_count(), 16);
    assert!(provider.max_in_flight() <= 2, "max in flight {}", provider.max_in_flight());
    assert!(controller.gate().peak() <= 2);
    Ok(())
}

#[tokio::test]
async fn test_run_withCrLfFile_shouldKeepLineEndings() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let docs = config.paths.docs_dir.clone();
    let output = config.paths.output_dir.clone();

    common::create_test_file(&docs, "windows.md", "# Heading words\r\n\r\n```\r\ncode here\r\n```\r\n")?;

    let provider = MockProvider::working();
    let controller = common::test_controller(config, &provider)?;
    controller.run(&docs, &output, RetranslateMode::Missing).await?;

    assert_eq!(
        fs::read_to_string(output.join("windows.md"))?,
        "# [uzn_Latn] Heading words\r\n\r\n```\r\ncode here\r\n```\r\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingSourceDir_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let output = config.paths.output_dir.clone();

    let provider = MockProvider::working();
    let controller = common::test_controller(config, &provider)?;
    let result = controller
        .run(&temp_dir.path().join("nowhere"), &output, RetranslateMode::Missing)
        .await;

    assert!(result.is_err());
    assert_eq!(provider.call_count(), 0);
    Ok(())
}

/// An empty tree is a successful run with nothing to do
#[test]
fn test_run_withEmptyTree_shouldSucceedWithNothingToDo() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::test_config(temp_dir.path());
    let docs = config.paths.docs_dir.clone();
    let output = config.paths.output_dir.clone();
    fs::create_dir_all(&docs)?;

    let provider = MockProvider::working();
    let controller = common::test_controller(config, &provider)?;
    let summary = tokio_test::block_on(async { controller.run(&docs, &output, RetranslateMode::Missing).await })?;

    assert_eq!(summary.processed, 0);
    assert!(!summary.has_failures());
    assert!(summary.message().contains("0 processed"));
    assert_eq!(provider.call_count(), 0);
    Ok(())
}
