//! PayFlow CLI - Command-line client for the PayFlow debt tracker
//!
//! Provides commands for:
//! - Listing debts (from the server, or the local cache when offline)
//! - Adding, updating and deleting debts, queued when the server is unreachable
//! - Inspecting and replaying the queue of pending changes
//! - Watching connectivity and syncing on reconnect

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod session;

use commands::{
    config::ConfigCommand,
    debts::{AddCommand, DeleteCommand, UpdateCommand},
    list::ListCommand,
    queue::{FlushCommand, QueueCommand},
    watch::WatchCommand,
};
use output::{get_formatter, OutputFormat};
use payflow_core::config::Config;
use session::CliContext;

#[derive(Debug, Parser)]
#[command(name = "payflow", version, about = "Offline-first client for the PayFlow debt tracker")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List debts
    List(ListCommand),
    /// Add a debt
    Add(AddCommand),
    /// Update a debt
    Update(UpdateCommand),
    /// Delete a debt
    Delete(DeleteCommand),
    /// Replay pending changes now
    Flush(FlushCommand),
    /// Show pending changes
    Queue(QueueCommand),
    /// Stay running and sync whenever the server becomes reachable
    Watch(WatchCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Filter used when `RUST_LOG` is not set
fn default_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose, &config.logging.level)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let ctx = CliContext {
        format,
        config_path,
        config,
    };

    let result = match &cli.command {
        Commands::List(cmd) => cmd.execute(&ctx).await,
        Commands::Add(cmd) => cmd.execute(&ctx).await,
        Commands::Update(cmd) => cmd.execute(&ctx).await,
        Commands::Delete(cmd) => cmd.execute(&ctx).await,
        Commands::Flush(cmd) => cmd.execute(&ctx).await,
        Commands::Queue(cmd) => cmd.execute(&ctx).await,
        Commands::Watch(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    };

    if let Err(e) = &result {
        get_formatter(format).error(&format!("{e:#}"));
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_fields() {
        let cli = Cli::try_parse_from([
            "payflow",
            "--json",
            "add",
            "--name",
            "Ali",
            "--box-name",
            "Box 3",
            "--amount",
            "25000",
            "--field",
            "monthsDue=1",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Add(cmd) => {
                assert_eq!(cmd.fields.name.as_deref(), Some("Ali"));
                assert_eq!(cmd.fields.box_name.as_deref(), Some("Box 3"));
                assert_eq!(cmd.fields.extra, vec!["monthsDue=1".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_update_paid() {
        let cli =
            Cli::try_parse_from(["payflow", "-v", "update", "65f1", "--paid", "true"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Update(cmd) => {
                assert_eq!(cmd.id, "65f1");
                assert_eq!(cmd.fields.paid, Some(true));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["payflow", "queue", "--config", "/tmp/p.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.yaml")));
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(0, "warn"), "warn");
        assert_eq!(default_filter(1, "warn"), "debug");
        assert_eq!(default_filter(3, "warn"), "trace");
    }
}
