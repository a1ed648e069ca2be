//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Prebake - devcontainer feature prebuilds
///
/// Bakes slow-to-install devcontainer features into a cached base image
/// and points the project's Dockerfile at it.
#[derive(Parser, Debug)]
#[command(name = "prebake")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PREBAKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workspace directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Explicit devcontainer.json path
    #[arg(long, global = true)]
    pub devcontainer: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the prebuild image and point the Dockerfile at it
    Prebuild(PrebuildArgs),

    /// Restore the Dockerfile's original base image
    Restore(RestoreArgs),

    /// Show the prebuild state of the project
    Status,

    /// Assign stable ports to forwarded services
    Ports(PortsArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the prebuild command
#[derive(Parser, Debug)]
pub struct PrebuildArgs {
    /// Rebuild even when the cached image is current
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be built without building or rewriting anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the restore command
#[derive(Parser, Debug)]
pub struct RestoreArgs {
    /// Also delete the prebuild cache, so the next prebuild starts fresh
    #[arg(long)]
    pub purge: bool,
}

/// Arguments for the ports command
#[derive(Parser, Debug)]
pub struct PortsArgs {
    /// Subcommand for ports
    #[command(subcommand)]
    pub action: PortsAction,
}

/// Ports subcommands
#[derive(Subcommand, Debug)]
pub enum PortsAction {
    /// Assign (or reuse) a port for each label
    Allocate {
        /// Service labels
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// List assigned ports
    List,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_prebuild() {
        let cli = Cli::parse_from(["prebake", "prebuild", "--force", "--dry-run"]);
        match cli.command {
            Commands::Prebuild(args) => {
                assert!(args.force);
                assert!(args.dry_run);
            }
            _ => panic!("expected Prebuild command"),
        }
    }

    #[test]
    fn cli_parses_restore_purge() {
        let cli = Cli::parse_from(["prebake", "restore", "--purge"]);
        assert!(matches!(cli.command, Commands::Restore(RestoreArgs { purge: true })));
    }

    #[test]
    fn cli_parses_global_workspace() {
        let cli = Cli::parse_from(["prebake", "status", "--workspace", "/src/app", "-vv"]);
        assert!(matches!(cli.command, Commands::Status));
        assert_eq!(cli.workspace, Some(PathBuf::from("/src/app")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_parses_ports_allocate() {
        let cli = Cli::parse_from(["prebake", "ports", "allocate", "web", "db"]);
        match cli.command {
            Commands::Ports(PortsArgs {
                action: PortsAction::Allocate { labels },
            }) => assert_eq!(labels, vec!["web", "db"]),
            _ => panic!("expected ports allocate"),
        }
    }

    #[test]
    fn ports_allocate_requires_label() {
        assert!(Cli::try_parse_from(["prebake", "ports", "allocate"]).is_err());
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["prebake", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected config init"),
        }
    }
}
