// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use mdxlate::app_config::{self, BatchMode, Config};
use mdxlate::app_controller::{Controller, RetranslateMode};
use mdxlate::translation::StatsStore;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for BatchMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliBatchMode {
    Single,
    Joined,
}

impl From<CliBatchMode> for BatchMode {
    fn from(mode: CliBatchMode) -> Self {
        match mode {
            CliBatchMode::Single => BatchMode::Single,
            CliBatchMode::Joined => BatchMode::Joined,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a documentation tree (default command)
    Translate(TranslateArgs),

    /// Show cumulative token and cost statistics
    Stats {
        /// Statistics file to read
        #[arg(long)]
        stats_file: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: PathBuf,
    },

    /// Generate shell completions for mdxlate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// Source documentation directory (defaults to `paths.docs_dir`)
    #[arg(value_name = "SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// Retranslate every file, even when an output exists
    #[arg(short, long)]
    force: bool,

    /// Retranslate files modified since their output was written
    #[arg(short, long, conflicts_with = "force")]
    incremental: bool,

    /// Output directory (defaults to `paths.output_dir`)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Translation cache file
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Run statistics file
    #[arg(long)]
    stats_file: Option<PathBuf>,

    /// Source language code (e.g., 'eng_Latn')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'uzn_Latn')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Request grouping strategy
    #[arg(short, long, value_enum)]
    batch_mode: Option<CliBatchMode>,

    /// Maximum number of backend calls in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Do not draw the progress bar
    #[arg(long)]
    no_progress: bool,
}

/// mdxlate - translate MDX/Markdown documentation trees
///
/// Translates the prose of a documentation tree while leaving code blocks,
/// front matter keys, component markup, links and URLs untouched.
#[derive(Parser, Debug)]
#[command(name = "mdxlate")]
#[command(version)]
#[command(about = "Translate MDX/Markdown documentation trees")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "mdxlate translates the prose of MDX/Markdown documentation and leaves code, markup and URLs untouched.

EXAMPLES:
    mdxlate docs                                # Translate docs/ into docs_uz/
    mdxlate -f docs                             # Retranslate every file
    mdxlate -i docs                             # Retranslate files changed since the last run
    mdxlate -o docs_ru -t rus_Cyrl docs         # Other target language and output directory
    mdxlate --batch-mode single docs            # One request per text
    mdxlate stats                               # Show token and cost statistics
    mdxlate completions bash > mdxlate.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

CREDENTIALS:
    The API key is read from the TILMOCH_API_KEY environment variable (a .env file
    is honoured) or from `translation.api_key` in the config file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn decoration_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::decoration_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a .env file
    dotenvy::dotenv().ok();

    // Accept everything here; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "mdxlate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Stats { stats_file, config_path }) => show_stats(stats_file, config_path),
        Some(Commands::Translate(args)) => exit_on_failures(run_translate(args).await?),
        None => exit_on_failures(run_translate(cli.translate).await?),
    }
}

fn exit_on_failures(all_succeeded: bool) -> Result<()> {
    if !all_succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn show_stats(stats_file: Option<PathBuf>, config_path: PathBuf) -> Result<()> {
    let config = Config::load_or_create(&config_path)?;
    let path = stats_file.unwrap_or(config.paths.stats_file);

    let stats = StatsStore::load(&path, config.translation.pricing);
    println!("{}", stats.report());
    Ok(())
}

/// Run a translation; returns `false` when any file failed
async fn run_translate(options: TranslateArgs) -> Result<bool> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(mode) = &options.batch_mode {
        config.translation.batch_mode = mode.clone().into();
    }
    if let Some(concurrency) = options.concurrency {
        config.translation.concurrent_requests = concurrency;
    }
    if let Some(dir) = &options.source_dir {
        config.paths.docs_dir = dir.clone();
    }
    if let Some(dir) = &options.output_dir {
        config.paths.output_dir = dir.clone();
    }
    if let Some(path) = &options.cache_file {
        config.paths.cache_file = path.clone();
    }
    if let Some(path) = &options.stats_file {
        config.paths.stats_file = path.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let source_dir = config.paths.docs_dir.clone();
    let output_dir = config.paths.output_dir.clone();
    let mode = RetranslateMode::from_flags(options.force, options.incremental);

    let mut controller = Controller::with_config(config)?;
    if options.no_progress {
        controller = controller.without_progress();
    }

    let summary = controller.run(&source_dir, &output_dir, mode).await?;
    for (path, reason) in &summary.failures {
        info!("Failed: {} ({})", path.display(), reason);
    }

    Ok(!summary.has_failures())
}
