// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Cadenza plugin manager.
//!
//! Layered TOML parsing with strict keys, XDG lookup, `CADENZA_*` environment
//! overrides and miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use cadenza_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("plugin dir: {}", config.plugin.dir);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{CadenzaConfig, LogConfig, PlaybackConfig, PluginConfig, SandboxConfig};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment failures are converted to diagnostics carrying source spans and
/// "did you mean" hints; semantic failures come from [`validation`].
pub fn load_and_validate() -> Result<CadenzaConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<CadenzaConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load a specific file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<CadenzaConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read every config file that exists so diagnostics can point into them.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    if let Ok(content) = std::fs::read_to_string("cadenza.toml") {
        let path = std::env::current_dir()
            .map(|d| d.join("cadenza.toml").display().to_string())
            .unwrap_or_else(|_| "cadenza.toml".to_string());
        sources.push((path, content));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("cadenza/cadenza.toml");
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push((path.display().to_string(), content));
        }
    }

    let system_path = std::path::Path::new("/etc/cadenza/cadenza.toml");
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}
