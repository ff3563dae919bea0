/*!
 * Common test utilities for the mdxlate test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use mdxlate::app_config::Config;
use mdxlate::app_controller::Controller;
use mdxlate::providers::mock::MockProvider;

/// A small MDX page touching most line kinds
pub const SAMPLE_PAGE: &str = r#"---
title: "Getting Started"
sidebar_position: 1
---

import Tabs from '@theme/Tabs';

# Welcome to the guide

This page explains how the project is organised.

```bash
npm install
```

- Install the dependencies first
"#;

/// `SAMPLE_PAGE` as translated by `MockProvider::working()` into `uzn_Latn`
pub const SAMPLE_PAGE_TRANSLATED: &str = r#"---
title: "[uzn_Latn] Getting Started"
sidebar_position: 1
---

import Tabs from '@theme/Tabs';

# [uzn_Latn] Welcome to the guide

[uzn_Latn] This page explains how the project is organised.

```bash
npm install
```

- [uzn_Latn] Install the dependencies first
"#;

/// Initialise test logging once; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file, and its parent directories, under `dir`
pub fn create_test_file(dir: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A configuration whose files all live under `root`, without pacing
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.docs_dir = root.join("docs");
    config.paths.output_dir = root.join("docs_uz");
    config.paths.cache_file = root.join("data").join("translation_cache.json");
    config.paths.stats_file = root.join("data").join("token_stats.json");
    config.translation.rate_limit_delay_ms = 0;
    config.translation.timeout_secs = 5;
    config
}

/// A controller over `provider` with the progress bar hidden
pub fn test_controller(config: Config, provider: &MockProvider) -> Result<Controller> {
    init_logging();
    Ok(Controller::with_provider(config, Arc::new(provider.clone()))?.without_progress())
}
