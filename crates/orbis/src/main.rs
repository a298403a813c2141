// SPDX-FileCopyrightText: 2026 Orbis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orbis - a host for runtime-discovered plugins.
//!
//! This is the binary entry point for the Orbis host.

mod plugins;
mod serve;
mod shutdown;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use orbis_config::{ConfigError, OrbisConfig};

/// Orbis - a host for runtime-discovered plugins.
#[derive(Parser, Debug)]
#[command(name = "orbis", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load all plugins and run until interrupted.
    Serve {
        /// Override `plugins.directory`.
        #[arg(long)]
        plugins_dir: Option<PathBuf>,
    },
    /// List the plugins found under the plugin root.
    Plugins {
        /// Override `plugins.directory`.
        #[arg(long)]
        plugins_dir: Option<PathBuf>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&Path>) -> Result<OrbisConfig, Vec<ConfigError>> {
    match path {
        Some(path) => orbis_config::load_and_validate_path(path),
        None => orbis_config::load_and_validate(),
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "orbis={log_level},orbis_plugin={log_level},orbis_config={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            orbis_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    match cli.command {
        Some(Commands::Serve { plugins_dir }) => {
            if let Some(dir) = plugins_dir {
                config.plugins.directory = dir;
            }
            serve::run_serve(config).await;
        }
        Some(Commands::Plugins { plugins_dir, json }) => {
            if let Some(dir) = plugins_dir {
                config.plugins.directory = dir;
            }
            if let Err(e) = plugins::run_plugins(config, json).await {
                eprintln!("orbis: failed to print plugin list: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match config.to_toml() {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("orbis: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("orbis: use --help for available commands");
        }
    }
}
