// orderpack CLI - assemble per-order reconciliation packets

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_SUCCESS};
use orderpack_recon::{run, RunConfig};

#[derive(Parser)]
#[command(name = "orderpack")]
#[command(about = "Assemble per-order reconciliation packets (summary PDF + transaction tables)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run packet assembly from a TOML config file
    #[command(after_help = "\
Examples:
  orderpack run orderpack.toml

Relative paths in the config resolve against the config file's directory.
A completed run exits 0 even when summaries were missing; check the miss
report in the output directory.")]
    Run {
        /// Path to the config file
        config: PathBuf,
    },

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  orderpack validate orderpack.toml")]
    Validate {
        /// Path to the config file
        config: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config } => cmd_run(config),
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(e.code)
        }
    }
}

/// Read and validate the config, resolving relative paths against the
/// config file's directory.
fn load_config(config_path: &Path) -> Result<RunConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| CliError {
        code: EXIT_RUNTIME,
        message: format!("cannot read {}: {e}", config_path.display()),
        hint: None,
    })?;

    let mut config = RunConfig::from_toml(&config_str).map_err(|e| CliError {
        code: EXIT_INVALID_CONFIG,
        message: e.to_string(),
        hint: None,
    })?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_against(base_dir);
    Ok(config)
}

fn cmd_run(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    let summary = run(&config).map_err(|e| CliError {
        code: EXIT_RUNTIME,
        message: e.to_string(),
        hint: None,
    })?;

    eprintln!(
        "{} orders: {} combined, {} missing, {} ambiguous, {} failed",
        summary.orders.len(),
        summary.combined,
        summary.missing,
        summary.ambiguous,
        summary.failed,
    );
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    println!("config OK");
    println!("  transactions: {}", config.transactions_csv.display());
    println!("  returns:      {}", config.returns_csv.display());
    println!("  summaries:    {}", config.summary_dir.display());
    println!("  output:       {}", config.output_dir.display());
    match config.order_cap() {
        Some(cap) => println!("  test mode:    first {cap} order(s)"),
        None => println!("  test mode:    off"),
    }
    Ok(())
}
