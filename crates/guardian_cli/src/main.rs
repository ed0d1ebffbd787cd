//! Command-line entry point over `guardian_core`.
//!
//! # Responsibility
//! - Verify core linkage (`ping`).
//! - Score one telemetry reading without touching storage (`score`).
//! - Create or migrate a database file (`init-db`).
//!
//! Output is one JSON document on stdout; errors go to stderr with a
//! non-zero exit code.

use clap::{Parser, Subcommand};
use guardian_core::db::migrations::current_user_version;
use guardian_core::{
    classify_phase, compute_indices, core_version, init_logging, open_db, ping, EngineConfig,
    ScoringContext, TelemetrySample,
};
use log::info;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "guardian")]
#[command(version, about = "Cognitive telemetry scoring and workflow engine", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute log directory; overrides `logging.directory`
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core health and version
    Ping,

    /// Compute indices and phase for one reading; any value may be negative
    Score {
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        keys_per_minute: f64,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        backspace_rate: f64,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        task_switch_rate: f64,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        meeting_overlap: f64,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        volatility: f64,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        sleep_deviation: f64,

        /// Negative values express a recovery deficit
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        recovery_ratio: f64,
    },

    /// Create or migrate a database file
    InitDb {
        #[arg(long)]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<serde_json::Value, String> {
    let mut config = match cli.config.as_deref() {
        Some(path) => EngineConfig::load(path).map_err(|err| err.to_string())?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.log_dir {
        config.logging.directory = Some(dir);
    }
    if config.logging.directory.is_some() {
        init_logging(&config.logging)?;
    }

    match cli.command {
        Commands::Ping => Ok(json!({
            "ping": ping(),
            "version": core_version(),
        })),
        Commands::Score {
            keys_per_minute,
            backspace_rate,
            task_switch_rate,
            meeting_overlap,
            volatility,
            sleep_deviation,
            recovery_ratio,
        } => {
            let sample = TelemetrySample {
                keys_per_minute,
                backspace_rate,
                task_switch_rate,
                ..TelemetrySample::new(0, chrono::Local::now().date_naive(), 0)
            };
            let context = ScoringContext {
                meeting_overlap,
                volatility,
                sleep_deviation,
                recovery_ratio,
            };
            sample.validate().map_err(|err| err.to_string())?;
            context.validate().map_err(|err| err.to_string())?;

            let indices = compute_indices(&sample, &context);
            let phase = classify_phase(&indices);
            Ok(json!({
                "indices": indices,
                "phase": phase.ordinal(),
                "label": phase.label(),
                "description": phase.description(),
            }))
        }
        Commands::InitDb { path } => {
            let conn = open_db(&path).map_err(|err| err.to_string())?;
            let version = current_user_version(&conn).map_err(|err| err.to_string())?;
            info!("event=cli_init_db module=cli status=ok schema_version={version}");
            Ok(json!({
                "path": path.display().to_string(),
                "schema_version": version,
            }))
        }
    }
}
