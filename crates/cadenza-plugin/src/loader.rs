// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns raw plugin source into a [`LoadedPlugin`] or a classified failure.
//!
//! Loading compiles the module, runs its `plugin_info` export in the sandbox,
//! and checks the declared host-version requirement. Nothing here touches
//! the registry.

use std::sync::Arc;

use cadenza_core::{CadenzaError, CapabilitySet, PluginStateCode};
use serde::Deserialize;
use tracing::debug;
use wasmtime::Module;

use crate::fetcher::strip_fragment;
use crate::identity::content_hash;
use crate::plugin::{PluginDefinition, PluginInstance};
use crate::sandbox::Sandbox;

/// Export every plugin must provide.
pub const INFO_EXPORT: &str = "plugin_info";

/// Version plugins' `appVersion` requirements are matched against.
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A plugin that compiled, described itself, and accepts this host.
pub struct LoadedPlugin {
    pub hash: String,
    pub instance: PluginInstance,
    pub module: Module,
}

/// A load that did not produce a usable plugin.
#[derive(Debug)]
pub struct LoadFailure {
    pub hash: String,
    /// Best-known name, when `plugin_info` got that far.
    pub name: Option<String>,
    /// The self-description, when the plugin produced a valid one.
    pub definition: Option<PluginDefinition>,
    pub error: CadenzaError,
}

impl LoadFailure {
    pub fn state_code(&self) -> PluginStateCode {
        self.error
            .state_code()
            .unwrap_or(PluginStateCode::CannotParse)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDefinition {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    src_url: Option<String>,
    #[serde(default)]
    app_version: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

pub struct PluginLoader {
    sandbox: Arc<Sandbox>,
    host_version: semver::Version,
}

impl PluginLoader {
    pub fn new(sandbox: Arc<Sandbox>) -> Result<Self, CadenzaError> {
        let host_version = semver::Version::parse(HOST_VERSION)
            .map_err(|e| CadenzaError::Internal(format!("invalid host version: {e}")))?;
        Ok(Self::with_host_version(sandbox, host_version))
    }

    pub fn with_host_version(sandbox: Arc<Sandbox>, host_version: semver::Version) -> Self {
        Self {
            sandbox,
            host_version,
        }
    }

    pub fn host_version(&self) -> &semver::Version {
        &self.host_version
    }

    /// `source_url` is where the bytes came from; it becomes the plugin's
    /// update URL when the plugin does not declare one.
    pub async fn load(
        &self,
        source: &[u8],
        source_url: Option<&str>,
    ) -> Result<LoadedPlugin, LoadFailure> {
        let hash = content_hash(source);
        let fail = |name: Option<String>, error: CadenzaError| LoadFailure {
            hash: hash.clone(),
            name,
            definition: None,
            error,
        };

        let module = self.sandbox.compile(source).map_err(|e| fail(None, e))?;

        let output = self
            .sandbox
            .call(&hash, &module, INFO_EXPORT, String::new())
            .await
            .map_err(|e| {
                fail(
                    None,
                    CadenzaError::CannotParse {
                        message: format!("{INFO_EXPORT} failed: {e}"),
                    },
                )
            })?
            .ok_or_else(|| {
                fail(
                    None,
                    CadenzaError::CannotParse {
                        message: format!("{INFO_EXPORT} produced no output"),
                    },
                )
            })?;

        let raw: RawDefinition = serde_json::from_str(&output).map_err(|e| {
            fail(
                None,
                CadenzaError::CannotParse {
                    message: format!("{INFO_EXPORT} output is not a valid definition: {e}"),
                },
            )
        })?;

        let name = raw
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                fail(
                    None,
                    CadenzaError::CannotParse {
                        message: "plugin has no name".to_string(),
                    },
                )
            })?;

        let src_url = raw
            .src_url
            .filter(|u| !u.trim().is_empty())
            .or_else(|| source_url.map(|u| strip_fragment(u).to_string()));
        let definition = PluginDefinition {
            name: name.clone(),
            version: raw.version,
            src_url,
            app_version: raw.app_version,
            author: raw.author,
            description: raw.description,
        };

        if let Some(required) = definition.app_version.as_deref() {
            let rejected = match semver::VersionReq::parse(required.trim()) {
                Err(e) => Some(CadenzaError::CannotParse {
                    message: format!("invalid appVersion '{required}': {e}"),
                }),
                Ok(req) if !req.matches(&self.host_version) => {
                    Some(CadenzaError::VersionNotMatch {
                        name: name.clone(),
                        required: required.to_string(),
                        current: self.host_version.to_string(),
                    })
                }
                Ok(_) => None,
            };
            if let Some(error) = rejected {
                return Err(LoadFailure {
                    hash,
                    name: Some(name),
                    definition: Some(definition),
                    error,
                });
            }
        }

        let capabilities = CapabilitySet::from_exports(module.exports().map(|e| e.name()));

        debug!(
            plugin = %name,
            hash = %hash,
            capabilities = capabilities.iter().count(),
            "loaded plugin"
        );

        Ok(LoadedPlugin {
            hash,
            instance: PluginInstance {
                definition,
                capabilities,
            },
            module,
        })
    }
}
