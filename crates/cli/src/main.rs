//! zarchive CLI - Mirror a Zulip organization's public streams as JSON documents

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

use commands::{cmd_config_init, cmd_config_show, cmd_status, cmd_sync};
use logging::{init_cli_logging, init_logging};
use zarchive::config::Config;

#[derive(Parser)]
#[command(name = "zarchive")]
#[command(about = "Mirror a Zulip organization's public streams as JSON documents")]
#[command(after_help = "\
QUICK START:
  zarchive config init            # Write ./zarchive.toml
  zarchive sync --full            # Build the archive from scratch
  zarchive sync                   # Fetch what is new since the last run
  zarchive status                 # Show what is archived")]
struct Cli {
  /// Config file (default: ./zarchive.toml, then the user config)
  #[arg(long, global = true, value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

/// Subcommands for `zarchive config`
#[derive(Subcommand)]
pub enum ConfigCommand {
  /// Show the effective configuration
  Show,
  /// Write a starter config file
  Init {
    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
  },
}

#[derive(Subcommand)]
enum Commands {
  /// Update the archive
  Sync {
    /// Rebuild every topic from the beginning of history
    #[arg(long)]
    full: bool,
  },
  /// Show archived streams and topics
  Status {
    /// Output the stream index as JSON
    #[arg(long)]
    json: bool,
  },
  /// Configuration management
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();

  if let Err(e) = run(cli).await {
    eprintln!("\nERROR\n {e:#}");
    std::process::exit(1);
  }
}

async fn run(cli: Cli) -> Result<()> {
  let config_path = cli.config.as_deref();

  match cli.command {
    Commands::Sync { full } => {
      let config = Config::load(config_path)?;
      // File logging only for sync runs, which may be long and unattended
      let _guard = init_logging(&config.logging);
      cmd_sync(&config, full).await
    }
    Commands::Status { json } => {
      init_cli_logging();
      cmd_status(&Config::load(config_path)?, json)
    }
    Commands::Config { command } => {
      init_cli_logging();
      match command {
        ConfigCommand::Show => cmd_config_show(config_path),
        ConfigCommand::Init { force } => cmd_config_init(config_path, force),
      }
    }
  }
}
