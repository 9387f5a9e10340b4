// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cadenza - plugin manager for a plugin-extensible music player.
//!
//! This is the binary entry point. It loads configuration, restores the
//! installed plugins, and runs one plugin management command.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod plugins;
mod queue;

use std::path::PathBuf;

use cadenza_config::CadenzaConfig;
use cadenza_plugin::PluginManager;
use clap::{Parser, Subcommand};

use crate::plugins::PluginCommand;
use crate::queue::ConsoleQueue;

/// Cadenza - plugin manager for a plugin-extensible music player.
#[derive(Parser, Debug)]
#[command(name = "cadenza", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage installed plugins.
    Plugin {
        #[command(subcommand)]
        action: PluginCommand,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => cadenza_config::load_and_validate_path(path),
        None => cadenza_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            cadenza_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log.level);

    match cli.command {
        Some(Commands::Plugin { action }) => {
            if let Err(e) = run_plugin_command(&config, action).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            println!("plugin.dir = {}", config.plugin.dir);
            println!("plugin.database_path = {}", config.plugin.database_path);
            println!(
                "plugin.subscribe_url = {}",
                config.plugin.subscribe_url.as_deref().unwrap_or("(unset)")
            );
            println!("sandbox.fuel = {}", config.sandbox.fuel);
            println!("sandbox.memory_mb = {}", config.sandbox.memory_mb);
            println!(
                "playback.click_music_in_album = {}",
                config.playback.click_music_in_album
            );
        }
        None => {
            println!("cadenza: use --help for available commands");
        }
    }
}

async fn run_plugin_command(
    config: &CadenzaConfig,
    action: PluginCommand,
) -> Result<(), cadenza_core::CadenzaError> {
    let manager = PluginManager::new(config).await?;
    manager.load_installed().await?;
    plugins::run(&manager, action, &config.playback, &ConsoleQueue).await
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cadenza={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_plugin_commands() {
        let cli = Cli::try_parse_from(["cadenza", "plugin", "sort", "b", "a"]).unwrap();
        match cli.command {
            Some(Commands::Plugin {
                action: PluginCommand::Sort { names },
            }) => assert_eq!(names, vec!["b", "a"]),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["cadenza", "--config", "/tmp/c.toml", "plugin", "subscribe"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Plugin {
                action: PluginCommand::Subscribe { locator: None }
            })
        ));
    }

    #[test]
    fn cli_requires_hash_for_update() {
        assert!(Cli::try_parse_from(["cadenza", "plugin", "update"]).is_err());
    }
}
