// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Cadenza plugin manager.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use cadenza_core::ClickBehavior;
use serde::{Deserialize, Serialize};

/// Top-level Cadenza configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CadenzaConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Plugin installation and persistence settings.
    #[serde(default)]
    pub plugin: PluginConfig,

    /// WASM sandbox limits for plugin code.
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// How list selections are handed to the music queue.
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Plugin installation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Directory holding the stored copy of every installed plugin.
    #[serde(default = "default_plugin_dir")]
    pub dir: String,

    /// SQLite database holding plugin ordering metadata.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Subscription URL or `.json` manifest used by `sync_subscription`.
    #[serde(default)]
    pub subscribe_url: Option<String>,

    /// File extensions accepted for local installs (without the dot).
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Timeout for a single remote fetch.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Largest plugin source accepted, in bytes.
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            dir: default_plugin_dir(),
            database_path: default_database_path(),
            subscribe_url: None,
            source_extensions: default_source_extensions(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_source_bytes: default_max_source_bytes(),
        }
    }
}

fn default_plugin_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("cadenza").join("plugins"))
        .unwrap_or_else(|| std::path::PathBuf::from("plugins"))
        .to_string_lossy()
        .into_owned()
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("cadenza").join("cadenza.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("cadenza.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_source_extensions() -> Vec<String> {
    vec!["wasm".to_string(), "wat".to_string()]
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_max_source_bytes() -> usize {
    8 * 1024 * 1024
}

/// Resource limits applied to every plugin evaluation and capability call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Fuel units available to one call.
    #[serde(default = "default_fuel")]
    pub fuel: u64,

    /// Maximum linear memory per instance, in MiB.
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u32,

    /// Wall-clock limit for one call, in seconds.
    #[serde(default = "default_epoch_timeout_secs")]
    pub epoch_timeout_secs: u64,

    /// Let plugins reach literal private/loopback IPs through `http_get`.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            fuel: default_fuel(),
            memory_mb: default_memory_mb(),
            epoch_timeout_secs: default_epoch_timeout_secs(),
            allow_private_hosts: false,
        }
    }
}

fn default_fuel() -> u64 {
    1_000_000_000
}

fn default_memory_mb() -> u32 {
    32
}

fn default_epoch_timeout_secs() -> u64 {
    10
}

/// Playback preferences consulted when a list entry is selected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub click_music_in_album: ClickBehavior,
}
