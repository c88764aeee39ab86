// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::Overrides;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        config: cli.config,
        storage_root: cli.storage_root,
        cache_dir: cli.cache_dir,
        serial: cli.serial,
    };

    match cli.command {
        Commands::Install { source, quiet } => {
            let config = commands::load_config(&overrides)?;
            commands::cmd_install(&source, config, quiet)
        }
        Commands::Inspect { path } => {
            let config = commands::load_config(&overrides)?;
            commands::cmd_inspect(&path, config)
        }
        Commands::Detect { names } => commands::cmd_detect(&names),
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
