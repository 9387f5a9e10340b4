// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cadenza plugin` subcommands.

use cadenza_config::PlaybackConfig;
use cadenza_core::types::filter_music;
use cadenza_core::{CadenzaError, MusicQueue, play_from_list};
use cadenza_plugin::{BatchReport, InstallOutcome, Plugin, PluginManager};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// List installed plugins in display order.
    List,
    /// Install one or more local files or URLs.
    Install {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Install from a URL.
    InstallUrl { url: String },
    /// Install every plugin of a subscription, or the configured one if omitted.
    Subscribe { locator: Option<String> },
    /// Re-fetch a plugin from its source URL.
    Update { hash: String },
    /// Remove a plugin by hash.
    Uninstall { hash: String },
    /// Remove every plugin and all metadata.
    UninstallAll,
    /// Set display order by plugin name.
    Sort {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Ask plugins to import a single track from a link or id.
    ImportItem { text: String },
    /// Ask plugins to import a track list from a link or id.
    ImportSheet {
        text: String,
        /// Only show tracks whose title, artist, album or source contains this.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Import a track list and play the track at `index`.
    ///
    /// `playback.click_music_in_album` decides whether the whole list is queued.
    PlaySheet { text: String, index: usize },
}

pub async fn run(
    manager: &PluginManager,
    command: PluginCommand,
    playback: &PlaybackConfig,
    queue: &dyn MusicQueue,
) -> Result<(), CadenzaError> {
    match command {
        PluginCommand::List => {
            let plugins = manager.sorted_plugins();
            if plugins.is_empty() {
                println!("no plugins installed");
            }
            for (idx, plugin) in plugins.iter().enumerate() {
                println!("{:>3}  {}", idx, describe(plugin));
            }
        }
        PluginCommand::Install { paths } => {
            for path in &paths {
                print_outcome(&manager.install_plugin(path).await?);
            }
        }
        PluginCommand::InstallUrl { url } => {
            print_outcome(&manager.install_plugin_from_url(&url).await?)
        }
        PluginCommand::Subscribe { locator } => {
            let report = match locator {
                Some(locator) => manager.install_from_subscription(&locator).await?,
                None => manager.sync_subscription().await?,
            };
            print_report(&report);
        }
        PluginCommand::Update { hash } => print_outcome(&manager.update_plugin(&hash).await?),
        PluginCommand::Uninstall { hash } => {
            manager.uninstall_plugin(&hash).await?;
            println!("uninstalled {hash}");
        }
        PluginCommand::UninstallAll => {
            manager.uninstall_all_plugins().await?;
            println!("all plugins uninstalled");
        }
        PluginCommand::Sort { names } => {
            manager.reorder(&names).await?;
            println!("order saved");
        }
        PluginCommand::ImportItem { text } => match manager.import_music_item(&text).await? {
            Some(item) => println!("{}", to_json(&item)?),
            None => println!("no plugin recognized the input"),
        },
        PluginCommand::ImportSheet { text, filter } => {
            let items = manager.import_music_sheet(&text).await?;
            if items.is_empty() {
                println!("no plugin recognized the input");
            } else {
                let shown = filter_music(filter.as_deref().unwrap_or(""), &items);
                println!("{}", to_json(&shown)?);
            }
        }
        PluginCommand::PlaySheet { text, index } => {
            let items = manager.import_music_sheet(&text).await?;
            let item = items.get(index).cloned().ok_or_else(|| {
                CadenzaError::Internal(format!(
                    "track {index} is out of range, the list has {} track(s)",
                    items.len()
                ))
            })?;
            play_from_list(queue, playback.click_music_in_album, item, items).await?;
        }
    }
    Ok(())
}

/// One `list` line: name, version, state, hash and source.
pub fn describe(plugin: &Plugin) -> String {
    let mut line = format!(
        "{} {} [{}] {}",
        plugin.name,
        plugin.version().unwrap_or("-"),
        plugin.state,
        plugin.hash
    );
    if let Some(reason) = plugin.state_code.description() {
        line.push_str(&format!(" ({reason})"));
    }
    if let Some(url) = plugin.src_url() {
        line.push_str(&format!(" <{url}>"));
    }
    line
}

fn print_outcome(outcome: &InstallOutcome) {
    println!("{} {} ({})", outcome.action, outcome.name, outcome.hash);
}

fn print_report(report: &BatchReport) {
    for (url, outcome) in &report.entries {
        println!("{} {} <{url}>", outcome.action, outcome.name);
    }
    println!("{} plugin(s) processed", report.len());
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CadenzaError> {
    serde_json::to_string_pretty(value).map_err(|e| CadenzaError::Internal(e.to_string()))
}
