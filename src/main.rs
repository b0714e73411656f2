// src/main.rs

use anyhow::Result;
use clap::Parser;

use stevedore::config::Configuration;
use stevedore::job::runner::ScriptKind;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Configuration::discover(cli.config.as_deref(), cli.overrides.into_overlay())?;

    match cli.command {
        Commands::Install { coordinate } => commands::install(config, &coordinate),
        Commands::Uninstall { coordinate } => commands::uninstall(config, &coordinate),
        Commands::Download { coordinate } => commands::download(config, &coordinate),
        Commands::List => commands::list(config),
        Commands::Resolve { coordinate } => commands::resolve(config, &coordinate),
        Commands::Start {
            coordinate,
            runtime_dir,
            params,
        } => commands::run_script(config, &coordinate, runtime_dir, params, ScriptKind::Start),
        Commands::Stop {
            coordinate,
            runtime_dir,
            params,
        } => commands::run_script(config, &coordinate, runtime_dir, params, ScriptKind::Stop),
        Commands::Config => commands::show_config(config),
    }
}
