// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./cadenza.toml` > `~/.config/cadenza/cadenza.toml` > `/etc/cadenza/cadenza.toml`
//! with environment variable overrides via `CADENZA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CadenzaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/cadenza/cadenza.toml` (system-wide)
/// 3. `~/.config/cadenza/cadenza.toml` (user XDG config)
/// 4. `./cadenza.toml` (local directory)
/// 5. `CADENZA_*` environment variables
pub fn load_config() -> Result<CadenzaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CadenzaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CadenzaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CadenzaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CadenzaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CadenzaConfig::default()))
        .merge(Toml::file("/etc/cadenza/cadenza.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("cadenza/cadenza.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("cadenza.toml"))
        .merge(env_provider())
}

/// Maps `CADENZA_<SECTION>_<KEY>` onto `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `CADENZA_PLUGIN_SUBSCRIBE_URL` must become
/// `plugin.subscribe_url`, not `plugin.subscribe.url`.
fn env_provider() -> Env {
    Env::prefixed("CADENZA_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("log_", "log.", 1)
            .replacen("plugin_", "plugin.", 1)
            .replacen("sandbox_", "sandbox.", 1)
            .replacen("playback_", "playback.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CADENZA_PLUGIN_SUBSCRIBE_URL", "https://example.com/plugins.json");
            jail.set_env("CADENZA_SANDBOX_EPOCH_TIMEOUT_SECS", "3");
            jail.create_file("cadenza.toml", "[log]\nlevel = \"debug\"\n")?;

            let config = load_config()?;
            assert_eq!(
                config.plugin.subscribe_url.as_deref(),
                Some("https://example.com/plugins.json")
            );
            assert_eq!(config.sandbox.epoch_timeout_secs, 3);
            assert_eq!(config.log.level, "debug");
            Ok(())
        });
    }
}
