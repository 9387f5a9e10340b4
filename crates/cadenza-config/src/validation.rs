// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Catches constraints serde cannot express: non-empty paths, positive
//! sandbox limits, and well-formed subscription locators.

use crate::diagnostic::ConfigError;
use crate::model::CadenzaConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first.
pub fn validate_config(config: &CadenzaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "log.level `{}` must be one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.plugin.dir.trim().is_empty() {
        fail("plugin.dir must not be empty".to_string());
    }

    if config.plugin.database_path.trim().is_empty() {
        fail("plugin.database_path must not be empty".to_string());
    }

    if config.plugin.source_extensions.is_empty() {
        fail("plugin.source_extensions must list at least one extension".to_string());
    }
    for ext in &config.plugin.source_extensions {
        if ext.is_empty() || ext.starts_with('.') {
            fail(format!(
                "plugin.source_extensions entry `{ext}` must be a bare extension such as `wasm`"
            ));
        }
    }

    if config.plugin.fetch_timeout_secs == 0 {
        fail("plugin.fetch_timeout_secs must be greater than 0".to_string());
    }

    if config.plugin.max_source_bytes == 0 {
        fail("plugin.max_source_bytes must be greater than 0".to_string());
    }

    if let Some(url) = &config.plugin.subscribe_url {
        let url = url.trim();
        let remote = url.starts_with("http://") || url.starts_with("https://");
        if !remote && !url.ends_with(".json") {
            fail(format!(
                "plugin.subscribe_url `{url}` must be an http(s) URL or a .json manifest"
            ));
        }
    }

    if config.sandbox.fuel == 0 {
        fail("sandbox.fuel must be greater than 0".to_string());
    }

    if config.sandbox.memory_mb == 0 {
        fail("sandbox.memory_mb must be greater than 0".to_string());
    }

    if config.sandbox.epoch_timeout_secs == 0 {
        fail("sandbox.epoch_timeout_secs must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
