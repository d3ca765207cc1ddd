use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

use diag_collector::cli::{Args, Commands};
use diag_collector::collectors::handle::{CollectionHandle, CollectionProgress};
use diag_collector::collectors::orchestrator::{NoProgress, ScheduleMode};
use diag_collector::config::{load_config, CollectionConfig, SourceEntry};
use diag_collector::constants::EXIT_ARCHIVE_FAILED;
use diag_collector::lifecycle::{CancelToken, RunningFlag};
use diag_collector::session::{run_collection, RunOutcome, SessionOptions};

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = initialize_logging(args.verbose, args.log_file.as_deref()) {
        eprintln!("{:#}", e);
    }

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_ARCHIVE_FAILED)
        }
    }
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(format!("Failed to open log file: {}", path.display()))?;
        loggers.push(WriteLogger::new(log_level, Config::default(), file));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")?;
    Ok(())
}

fn run(args: &Args) -> Result<u8> {
    if let Some(cmd) = &args.command {
        handle_subcommand(cmd, args)?;
        return Ok(0);
    }

    info!("Starting diagnostic collection");

    let config = load_config(args.config.as_deref())?;
    let registry = config.build_registry()?;
    let categories = args.select_categories(&registry)?;

    let cancel = match CancelToken::with_ctrlc() {
        Ok(token) => token,
        Err(e) => {
            warn!("Could not install Ctrl+C handler: {}", e);
            CancelToken::manual()
        }
    };

    let mut options = SessionOptions::new(categories, args.exclusion_policy(&config));
    options.mode = if args.sequential {
        ScheduleMode::Sequential
    } else {
        ScheduleMode::Parallel
    };
    options.max_threads = args.threads;
    options.destination_dir = args.output.clone();
    options.archive_prefix = config.archive_prefix.clone();
    options.write_summary = args.summary;

    let outcome = if args.sequential {
        run_with_progress(options, cancel)?
    } else {
        run_collection(&options, &cancel, &RunningFlag::new(), &NoProgress)?
    };

    report_outcome(&outcome);
    Ok(outcome.exit_code())
}

/// Sequential run on a background thread, logging progress as it arrives
fn run_with_progress(options: SessionOptions, cancel: CancelToken) -> Result<RunOutcome> {
    let handle = CollectionHandle::spawn(options, cancel, RunningFlag::new())?;

    for message in handle.progress_rx.iter() {
        match message {
            CollectionProgress::Progress { percent, category } => {
                info!("[{:>3}%] {} done", percent, category);
            }
            CollectionProgress::Finished { .. } => break,
        }
    }

    handle.wait()
}

fn report_outcome(outcome: &RunOutcome) {
    let summary = outcome.summary();
    match outcome {
        RunOutcome::ArchiveCreated { path, .. } => info!(
            "Collected {} file(s) from {} categories into {}",
            summary.files_copied(),
            summary.categories.iter().filter(|c| c.produced_output).count(),
            path.display()
        ),
        RunOutcome::ArchiveFailed { .. } => error!("Files were collected but no archive could be written"),
        RunOutcome::NothingCollected { .. } => warn!("No diagnostic files were found"),
        RunOutcome::Cancelled { .. } => warn!("Collection cancelled"),
    }

    if summary.failure_count() > 0 {
        warn!("{} source(s) could not be collected", summary.failure_count());
    }
}

/// Handle subcommands (init-config and list-categories)
fn handle_subcommand(cmd: &Commands, args: &Args) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            info!("Creating default configuration file at {}", path.display());
            CollectionConfig::create_default_config_file(path)?;
            info!("Configuration created successfully");
            Ok(())
        }
        Commands::ListCategories => {
            let config = load_config(args.config.as_deref())?;
            for category in config.build_registry()?.all_categories() {
                let limit = if category.size_limited { "" } else { " (no size limit)" };
                println!("{}{}", category.name, limit);
                for source in &category.sources {
                    match source {
                        SourceEntry::Path(raw) => println!("    {}", raw),
                        SourceEntry::Exporter(exporter) => println!("    <{}>", exporter.name()),
                    }
                }
            }
            Ok(())
        }
    }
}
