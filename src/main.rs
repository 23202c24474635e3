//! CLI entry point for the gun law panel builder.
//!
//! `fetch` stages the raw mortality CSV and law workbook into the data tree,
//! `merge` builds the state-year analytic table from them, and `profile`
//! summarizes the finished table.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use gun_law_panel::{
    config::{LAWS_FILE, MORTALITY_FILE, PipelineConfig},
    fetch::fetch,
    merge::run_merge,
    output::print_json,
    profile::run_profile,
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gun_law_panel")]
#[command(about = "Build a state-year firearm law and mortality table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the raw source files into the standardized data tree
    Fetch {
        /// Path to the mortality CSV (CDC)
        #[arg(long, default_value = MORTALITY_FILE)]
        mortality: PathBuf,

        /// Path to the firearm law Excel workbook
        #[arg(long, default_value = LAWS_FILE)]
        laws: PathBuf,
    },
    /// Merge the staged sources into the processed analytic table
    Merge,
    /// Summarize the processed analytic table
    Profile,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Held until exit so buffered file logs are flushed.
    let _file_guard = init_tracing()?;

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    match cli.command {
        Commands::Fetch { mortality, laws } => {
            let report = fetch(&config, &mortality, &laws)?;
            info!(
                mortality = %report.mortality.path.display(),
                laws = %report.laws.path.display(),
                "Fetch step complete"
            );
            print_json(&report)?;
        }
        Commands::Merge => {
            let summary = run_merge(&config)?;
            print_json(&summary)?;
        }
        Commands::Profile => {
            run_profile(&config)?;
        }
    }

    Ok(())
}

/// Colored stderr logs plus a JSON daily-rolling log file.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gun_law_panel.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gun_law_panel.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}
