//! wordwatch CLI
//!
//! Watches a directory for new text files and writes word-frequency reports.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wordwatch::{Config, DirectoryWatchCoordinator, WatchSettings, WordAnalyzer};

#[derive(Parser, Debug)]
#[command(name = "wordwatch")]
#[command(author, version, about = "Word-frequency reports for new text files")]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Watch a directory (default). Prompts for one if not given.
    Watch {
        /// Directory to watch
        dir: Option<PathBuf>,
    },

    /// Analyze a single file and print its report
    Analyze {
        /// File to analyze
        file: PathBuf,

        /// Also write the report next to the file
        #[arg(long)]
        write: bool,
    },

    /// Validate config file
    Check,

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("WORDWATCH_LOG").unwrap_or(log_level),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    wordwatch::notifications::init(config.general.notifications_enabled);

    match cli.command {
        None => watch(&config, None).await?,
        Some(Commands::Watch { dir }) => watch(&config, dir).await?,
        Some(Commands::Analyze { file, write }) => {
            let analyzer = WordAnalyzer::new(config.watch.top_n);
            let report = analyzer.analyze(&file)?;
            println!("{}", report.to_json()?);
            eprintln!(
                "{}: {} lines, {} distinct words, last modified {}",
                report.file_name(),
                report.line_count(),
                report.word_frequencies().len(),
                report.modified().format(wordwatch::report::TIMESTAMP_FORMAT)
            );
            if write {
                let path = wordwatch::report::write_report(
                    &report,
                    &file,
                    &config.watch.report_extension,
                )?;
                eprintln!("Report written to {}", path.display());
            }
        }
        Some(Commands::Check) => {
            WatchSettings::from_config(&config.watch)?;
            println!("✓ Config is valid");
            match &config.watch.directory {
                Some(dir) => println!("  directory: {}", dir.display()),
                None => println!("  directory: (prompt)"),
            }
            println!("  pattern: {}", config.watch.pattern);
            println!("  debounce: {}s", config.watch.debounce_seconds);
            println!("  report extension: .{}", config.watch.report_extension);
            println!("  top words: {}", config.watch.top_n);
        }
        Some(Commands::Init { force }) => {
            let path = cli
                .config
                .clone()
                .or_else(Config::default_path)
                .context("Could not determine config path")?;
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            let written = Config::default().save(Some(&path))?;
            println!("Wrote {}", written.display());
        }
    }

    Ok(())
}

async fn watch(config: &Config, dir: Option<PathBuf>) -> Result<()> {
    let settings = WatchSettings::from_config(&config.watch)?;
    let dir = match dir.or_else(|| config.watch.directory.clone()) {
        Some(dir) => wordwatch::expand_path(&dir),
        None => prompt_for_directory()?,
    };

    let mut coordinator = DirectoryWatchCoordinator::native(settings);
    coordinator
        .start(&dir)
        .with_context(|| format!("Cannot watch {}", dir.display()))?;

    println!(
        "Watching {} for new {} files. Press Enter to stop.",
        dir.display(),
        config.watch.pattern
    );

    tokio::select! {
        res = wait_for_enter() => res?,
        res = tokio::signal::ctrl_c() => res?,
    }

    coordinator.stop();
    println!(
        "Stopped. {} reports written, {} failures.",
        coordinator.reports_written(),
        coordinator.failures()
    );
    Ok(())
}

/// Ask for a directory until an existing one is entered
fn prompt_for_directory() -> Result<PathBuf> {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("Directory to watch: ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            anyhow::bail!("No directory given");
        }
        let candidate = wordwatch::expand_path(Path::new(line.trim()));
        if candidate.is_dir() {
            return Ok(candidate);
        }
        println!("'{}' is not a directory, try again.", candidate.display());
    }
}

async fn wait_for_enter() -> Result<()> {
    // A detached thread so a pending stdin read does not hold up shutdown
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = tx.send(std::io::stdin().lock().read_line(&mut line).map(|_| ()));
    });
    rx.await.context("stdin reader exited")??;
    Ok(())
}
