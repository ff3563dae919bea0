/*!
 * Tests for file and directory utilities
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use mdxlate::file_utils::FileManager;
use crate::common;

#[test]
fn test_find_files_withNestedTree_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "b.mdx", "b")?;
    common::create_test_file(root, "a/intro.md", "a")?;
    common::create_test_file(root, "a/deep/more.mdx", "c")?;
    common::create_test_file(root, "a/image.png", "x")?;

    let files = FileManager::find_files(root, &["mdx".to_string(), "md".to_string()])?;
    let relative: Vec<PathBuf> = files
        .iter()
        .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
        .collect();

    assert_eq!(
        relative,
        vec![
            PathBuf::from("a/deep/more.mdx"),
            PathBuf::from("a/intro.md"),
            PathBuf::from("b.mdx"),
        ]
    );
    Ok(())
}

#[test]
fn test_mirror_output_path_withOutsideFile_shouldUseFileName() {
    let output = FileManager::mirror_output_path("/elsewhere/page.mdx", "docs", "docs_uz");
    assert_eq!(output, PathBuf::from("docs_uz/page.mdx"));
}

#[test]
fn test_write_to_file_shouldReplaceExistingContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "out/page.mdx", "old content")?;

    FileManager::write_to_file(&path, "new content")?;
    assert_eq!(fs::read_to_string(&path)?, "new content");

    // No temporary files left behind
    assert_eq!(fs::read_dir(path.parent().unwrap())?.count(), 1);
    Ok(())
}

#[test]
fn test_is_newer_shouldCompareModificationTimes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "source.mdx", "source")?;
    let target = common::create_test_file(temp_dir.path(), "target.mdx", "target")?;

    let now = SystemTime::now();
    fs::File::options().write(true).open(&source)?.set_modified(now - Duration::from_secs(60))?;
    fs::File::options().write(true).open(&target)?.set_modified(now)?;
    assert!(!FileManager::is_newer(&source, &target)?);

    fs::File::options().write(true).open(&source)?.set_modified(now + Duration::from_secs(60))?;
    assert!(FileManager::is_newer(&source, &target)?);
    Ok(())
}

#[test]
fn test_ensure_dir_shouldCreateNestedDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("one/two/three");

    FileManager::ensure_dir(&nested)?;
    assert!(FileManager::dir_exists(&nested));
    assert!(!FileManager::file_exists(&nested));
    Ok(())
}
