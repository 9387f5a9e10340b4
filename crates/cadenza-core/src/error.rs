// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cadenza plugin manager.

use thiserror::Error;

use crate::types::PluginStateCode;

/// The primary error type used across the plugin manager and its collaborators.
#[derive(Debug, Error)]
pub enum CadenzaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Metadata persistence or plugin directory I/O errors.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Plugin source could not be retrieved, or was empty.
    #[error("failed to fetch {locator}: {message}")]
    Fetch {
        locator: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Plugin source failed to compile or evaluate, or lacks a name.
    #[error("cannot parse plugin: {message}")]
    CannotParse { message: String },

    /// The plugin's declared host version range excludes the running host.
    #[error("plugin '{name}' requires app version {required}, running {current}")]
    VersionNotMatch {
        name: String,
        required: String,
        current: String,
    },

    /// A newer version of a plugin with the same name is already installed.
    #[error("plugin '{name}' {installed} is already installed, refusing to replace it with {candidate}")]
    NewerVersionInstalled {
        name: String,
        installed: String,
        candidate: String,
    },

    /// The plugin declares no source URL, so there is nothing to update from.
    #[error("plugin '{name}' has no source URL and cannot be updated")]
    NotUpdatable { name: String },

    /// No installed plugin has the given hash.
    #[error("no installed plugin with hash {hash}")]
    PluginNotFound { hash: String },

    /// A subscription manifest could not be parsed.
    #[error("invalid subscription manifest: {message}")]
    Subscription { message: String },

    /// One or more installs in a batch failed. Successful siblings stay installed.
    #[error("{} of {total} plugin installs failed:\n{}", failures.len(), failures.join("\n"))]
    AggregateInstall { failures: Vec<String>, total: usize },

    /// A plugin capability call failed inside the sandbox.
    #[error("plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CadenzaError {
    /// Maps loader failures onto the state code shown next to a plugin.
    ///
    /// Returns `None` for errors that do not describe a plugin's own state.
    pub fn state_code(&self) -> Option<PluginStateCode> {
        match self {
            CadenzaError::CannotParse { .. } => Some(PluginStateCode::CannotParse),
            CadenzaError::VersionNotMatch { .. } => Some(PluginStateCode::VersionNotMatch),
            _ => None,
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        CadenzaError::Storage {
            source: Box::new(e),
        }
    }
}
