// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use subrecut::app_config::{self, Config, DEFAULT_CONFIG_FILE};
use subrecut::app_controller::Controller;
use subrecut::errors::AppError;
use subrecut::file_utils::FileManager;
use subrecut::report;

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-cut the subtitles to translate for every configured film
    Translate(TranslateArgs),

    /// Write the episode cut list of one film
    Cut(CutArgs),

    /// Compute (and optionally apply) a constant shift between two folders of subtitles
    Sync(SyncArgs),

    /// Generate a config file listing the films of a folder
    Init {
        /// Folder holding the film subtitle files
        #[arg(value_name = "FILMS_DIR")]
        films_dir: PathBuf,

        /// Config file to write
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions for subrecut
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Only process these film numbers (comma separated)
    #[arg(long, value_delimiter = ',')]
    films: Vec<u32>,

    /// Process films one after the other with full logs
    #[arg(short, long)]
    single_thread: bool,

    /// List every missing line in the report instead of the three longest
    #[arg(long)]
    all_missing: bool,
}

#[derive(Parser, Debug)]
struct CutArgs {
    /// Film subtitle file name, the first configured film when omitted
    #[arg(value_name = "FILM")]
    film: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Folder receiving the cut list
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct SyncArgs {
    /// Folder of correctly timed subtitles
    #[arg(short, long)]
    reference: PathBuf,

    /// Folder of subtitles to shift, paired with the reference files by sorted name
    #[arg(short, long)]
    target: PathBuf,

    /// Configuration file path, defaults apply when it does not exist
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// The two folders are in different languages
    #[arg(long)]
    cross_language: bool,

    /// Largest expected shift in ms
    #[arg(long)]
    max_shift: Option<i64>,

    /// Rewrite the target files with the computed shifts
    #[arg(long)]
    apply: bool,
}

/// subrecut - re-cut episode subtitles to match a film edit
#[derive(Parser, Debug)]
#[command(name = "subrecut")]
#[command(version)]
#[command(about = "Re-cut and re-time episode subtitles to fit a film assembled from those episodes")]
#[command(long_about = "subrecut finds, for every subtitle line of a film, the episode and time it comes from,
then rebuilds subtitles of another language for the film from the same episode ranges.

EXAMPLES:
    subrecut init films/                        # Create subrecut.conf.json for the films in films/
    subrecut translate                          # Re-cut every configured film
    subrecut translate --films 1,3 -s           # Only films 1 and 3, sequentially
    subrecut cut \"Film 2.ass\"                   # Write the cut list of one film
    subrecut sync -r french/ -t english/ --apply
    subrecut completions bash > subrecut.bash  # Generate bash completions")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
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
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config or the command line says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    let cli_level: Option<app_config::LogLevel> = cli.log_level.map(Into::into);
    if let Some(level) = &cli_level {
        log::set_max_level(level.to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subrecut", &mut std::io::stdout());
            Ok(())
        }
        Commands::Init { films_dir, output, force } => run_init(&films_dir, &output, force),
        Commands::Translate(args) => run_translate(args, cli_level).await,
        Commands::Cut(args) => run_cut(args, cli_level),
        Commands::Sync(args) => run_sync(args, cli_level),
    }
}

/// Load the config and apply its log level unless the command line set one
fn load_config(path: &Path, cli_level: &Option<app_config::LogLevel>) -> Result<Config, AppError> {
    if !FileManager::file_exists(path) {
        return Err(AppError::Config(format!(
            "Config file not found at {:?}, create one with `subrecut init <films folder>`",
            path
        )));
    }

    let mut config = Config::load(path)?;
    match cli_level {
        Some(level) => config.log_level = level.clone(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }
    Ok(config)
}

fn run_init(films_dir: &Path, output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(anyhow!("{:?} already exists (use --force to overwrite)", output));
    }

    let config = Config::generate(films_dir)
        .with_context(|| format!("Failed to list films in {:?}", films_dir))?;
    config.save(output)?;

    info!("Config with {} films written to {:?}", config.films_to_build.len(), output);
    info!("Fill in covered-episodes for each film before running translate");
    Ok(())
}

async fn run_translate(args: TranslateArgs, cli_level: Option<app_config::LogLevel>) -> Result<()> {
    let mut config = load_config(&args.config, &cli_level)?;
    config.retain_films(&args.films);
    if config.films_to_build.is_empty() {
        warn!("No film selected, nothing to do");
        return Ok(());
    }

    let start_time = std::time::Instant::now();
    let controller = Controller::with_config(config)?;
    let results = if args.single_thread {
        controller.run_batch_single_thread()?
    } else {
        controller.run_batch().await?
    };

    report::print_stats(&results, args.all_missing);
    info!("{} films processed in {:.1?}", results.len(), start_time.elapsed());
    Ok(())
}

fn run_cut(args: CutArgs, cli_level: Option<app_config::LogLevel>) -> Result<()> {
    let config = load_config(&args.config, &cli_level)?;
    let controller = Controller::with_config(config)?;

    let (cuts, stats, output) = controller.run_cut(args.film.as_deref(), &args.output_dir)?;

    report::print_stats(std::slice::from_ref(&stats), false);
    info!("{} cuts written to {:?}", cuts.len(), output);
    Ok(())
}

fn run_sync(args: SyncArgs, cli_level: Option<app_config::LogLevel>) -> Result<()> {
    let mut config = if FileManager::file_exists(&args.config) {
        load_config(&args.config, &cli_level)?
    } else {
        Config::default()
    };

    if args.cross_language {
        config.sync.cross_language = true;
    }
    if let Some(max_shift) = args.max_shift {
        config.sync.max_shift_ms = max_shift;
    }

    let controller = Controller::with_config(config)?;
    let results = controller.run_sync(&args.reference, &args.target, args.apply)?;

    for result in &results {
        match &result.outcome {
            Ok(estimate) => println!(
                "{}: {} ms ({} pairs)",
                result.target.display(),
                estimate.shift_ms,
                result.pairs
            ),
            Err(e) => println!("{}: not synced, {}", result.target.display(), e),
        }
    }
    if !args.apply {
        info!("Run again with --apply to rewrite the target files");
    }
    Ok(())
}
