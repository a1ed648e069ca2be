//! Prebake - devcontainer feature prebuilds
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use prebake::cli::commands::{self, resolve_config_path};
use prebake::cli::{Cli, Commands};
use prebake::config::ConfigManager;
use prebake::error::{PrebakeError, PrebakeResult};
use prebake::prebuild::Outcome;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PrebakeResult<ExitCode> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_tracing(cli.verbose, &config.general.log_format);

    let workspace = match cli.workspace {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| PrebakeError::io("getting current directory", e))?,
    };
    let devcontainer = cli.devcontainer.as_deref();

    match cli.command {
        Commands::Prebuild(args) => {
            let config_path = resolve_config_path(&workspace, devcontainer)?;
            commands::prebuild(args, &config_path, &config)
                .await
                .map(exit_code)
        }
        Commands::Restore(args) => {
            let config_path = resolve_config_path(&workspace, devcontainer)?;
            commands::restore(args, &config_path, &config)
                .await
                .map(exit_code)
        }
        Commands::Status => {
            let config_path = resolve_config_path(&workspace, devcontainer)?;
            commands::status(&config_path, &config).await.map(exit_code)
        }
        Commands::Ports(args) => commands::ports(args, &config)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Config(args) => commands::config(args, &config_manager, &config)
            .await
            .map(|()| ExitCode::SUCCESS),
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `log_format = "json"` switches formatter
fn init_tracing(verbose: u8, log_format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("prebake=warn"),
        1 => EnvFilter::new("prebake=info"),
        _ => EnvFilter::new("prebake=debug"),
    };

    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn exit_code(outcome: Outcome) -> ExitCode {
    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
