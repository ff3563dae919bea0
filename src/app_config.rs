use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code as understood by the translation backend
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code as understood by the translation backend
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation backend and scheduling settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Line classifier settings
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Input/output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How uncached texts are grouped into backend requests
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// One request per text
    Single,
    /// Many texts joined by the separator sentinel in one request
    #[default]
    Joined,
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Joined => write!(f, "joined"),
        }
    }
}

impl std::str::FromStr for BatchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "joined" | "batched" => Ok(Self::Joined),
            _ => Err(anyhow!("Invalid batch mode: {}", s)),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Backend URL receiving `{text, source_lang, target_lang, model}`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; when empty the key is read from `api_key_env`
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Maximum number of external calls in flight across the whole run
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Maximum number of files processed at the same time
    #[serde(default = "default_concurrent_files")]
    pub concurrent_files: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause after each request, in milliseconds, while the permit is held
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Request grouping strategy
    #[serde(default)]
    pub batch_mode: BatchMode,

    /// Maximum number of texts per joined request
    #[serde(default = "default_batch_max_items")]
    pub batch_max_items: usize,

    /// Maximum number of characters per joined request
    #[serde(default = "default_batch_max_chars")]
    pub batch_max_chars: usize,

    /// Rates used for the cost estimate
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: String::new(),
            api_key_env: default_api_key_env(),
            concurrent_requests: default_concurrent_requests(),
            concurrent_files: default_concurrent_files(),
            timeout_secs: default_timeout_secs(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            batch_mode: BatchMode::default(),
            batch_max_items: default_batch_max_items(),
            batch_max_chars: default_batch_max_chars(),
            pricing: PricingConfig::default(),
        }
    }
}

impl TranslationConfig {
    /// Resolve the API key from the config file or the environment
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if !self.api_key.trim().is_empty() {
            return Ok(self.api_key.trim().to_string());
        }

        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ConfigError::MissingCredential {
                env_var: self.api_key_env.clone(),
            }),
        }
    }
}

/// Cost rates in USD per 1K tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PricingConfig {
    #[serde(default = "default_input_cost_per_1k")]
    pub input_cost_per_1k: f64,

    #[serde(default = "default_output_cost_per_1k")]
    pub output_cost_per_1k: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_cost_per_1k: default_input_cost_per_1k(),
            output_cost_per_1k: default_output_cost_per_1k(),
        }
    }
}

/// Settings of the line classifier
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SegmenterConfig {
    /// Minimum alphabetic characters for a list item or paragraph to be translated
    #[serde(default = "default_min_alpha_chars")]
    pub min_alpha_chars: usize,

    /// Minimum inner length of a single-line `<Tag>text</Tag>` to be translated
    #[serde(default = "default_min_component_inline_len")]
    pub min_component_inline_len: usize,

    /// Fence language tags whose content is prose
    #[serde(default = "default_prose_languages")]
    pub prose_languages: Vec<String>,

    /// Components that never carry translatable text (media embeds)
    #[serde(default = "default_skip_components")]
    pub skip_components: Vec<String>,

    /// Split lines on inline code, links and URLs before translating
    #[serde(default = "default_true")]
    pub link_aware: bool,

    /// Track `export` declarations as blocks
    #[serde(default = "default_true")]
    pub export_blocks: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_alpha_chars: default_min_alpha_chars(),
            min_component_inline_len: default_min_component_inline_len(),
            prose_languages: default_prose_languages(),
            skip_components: default_skip_components(),
            link_aware: true,
            export_blocks: true,
        }
    }
}

/// Input and output locations
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    #[serde(default = "default_stats_file")]
    pub stats_file: PathBuf,

    /// File extensions picked up when walking the source directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            output_dir: default_output_dir(),
            cache_file: default_cache_file(),
            stats_file: default_stats_file(),
            extensions: default_extensions(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "eng_Latn".to_string()
}

fn default_target_language() -> String {
    "uzn_Latn".to_string()
}

fn default_endpoint() -> String {
    "https://websocket.tahrirchi.uz/translate-v2".to_string()
}

fn default_model() -> String {
    "tilmoch".to_string()
}

fn default_api_key_env() -> String {
    "TILMOCH_API_KEY".to_string()
}

fn default_concurrent_requests() -> usize {
    10
}

fn default_concurrent_files() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_delay_ms() -> u64 {
    200
}

fn default_batch_max_items() -> usize {
    50
}

fn default_batch_max_chars() -> usize {
    4000
}

fn default_input_cost_per_1k() -> f64 {
    0.005
}

fn default_output_cost_per_1k() -> f64 {
    0.015
}

fn default_min_alpha_chars() -> usize {
    10
}

fn default_min_component_inline_len() -> usize {
    10
}

fn default_prose_languages() -> Vec<String> {
    ["text", "txt", "plaintext", "markdown", "md"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_skip_components() -> Vec<String> {
    ["Image", "img", "iframe", "video", "Video", "YouTube"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("docs_uz")
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("data/translation_cache.json")
}

fn default_stats_file() -> PathBuf {
    PathBuf::from("data/token_stats.json")
}

fn default_extensions() -> Vec<String> {
    vec!["mdx".to_string(), "md".to_string()]
}

impl Config {
    /// Load the configuration file, writing a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    ///
    /// The credential is checked separately by `TranslationConfig::resolve_api_key`
    /// so that commands which never call the backend can run without one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_language.trim().is_empty() {
            return Err(invalid("source_language", "must not be empty"));
        }
        if self.target_language.trim().is_empty() {
            return Err(invalid("target_language", "must not be empty"));
        }
        if self.source_language == self.target_language {
            return Err(invalid("target_language", "must differ from source_language"));
        }

        let translation = &self.translation;
        if translation.endpoint.trim().is_empty() {
            return Err(invalid("translation.endpoint", "must not be empty"));
        }
        url::Url::parse(&translation.endpoint)
            .map_err(|e| invalid("translation.endpoint", &e.to_string()))?;
        if translation.concurrent_requests == 0 {
            return Err(invalid("translation.concurrent_requests", "must be at least 1"));
        }
        if translation.concurrent_files == 0 {
            return Err(invalid("translation.concurrent_files", "must be at least 1"));
        }
        if translation.timeout_secs == 0 {
            return Err(invalid("translation.timeout_secs", "must be at least 1"));
        }
        if translation.batch_max_items == 0 {
            return Err(invalid("translation.batch_max_items", "must be at least 1"));
        }
        if translation.batch_max_chars == 0 {
            return Err(invalid("translation.batch_max_chars", "must be at least 1"));
        }
        if translation.pricing.input_cost_per_1k < 0.0 || translation.pricing.output_cost_per_1k < 0.0 {
            return Err(invalid("translation.pricing", "rates must not be negative"));
        }

        if self.segmenter.min_alpha_chars == 0 {
            return Err(invalid("segmenter.min_alpha_chars", "must be at least 1"));
        }
        if self.paths.extensions.is_empty() {
            return Err(invalid("paths.extensions", "must list at least one extension"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            segmenter: SegmenterConfig::default(),
            paths: PathsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
