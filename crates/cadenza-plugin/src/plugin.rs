// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Installed plugin records.

use std::path::PathBuf;
use std::sync::Arc;

use cadenza_core::{CapabilitySet, PluginState, PluginStateCode};
use serde::{Deserialize, Serialize};
use wasmtime::Module;

use crate::methods::PluginMethods;
use crate::sandbox::Sandbox;

/// What a plugin reports about itself from `plugin_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Where updates are fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_url: Option<String>,
    /// Semver requirement on the host version, e.g. `">=0.1, <2"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The parsed capability object of a successfully loaded plugin.
#[derive(Debug, Clone)]
pub struct PluginInstance {
    pub definition: PluginDefinition,
    pub capabilities: CapabilitySet,
}

/// One entry of the registry.
///
/// `hash` is the identity; `name` keys user preferences. Entries restored in
/// the `Error` state have an empty capability set, and an instance only when
/// `plugin_info` produced a definition.
pub struct Plugin {
    pub hash: String,
    pub name: String,
    pub path: PathBuf,
    pub instance: Option<PluginInstance>,
    pub methods: PluginMethods,
    pub state: PluginState,
    pub state_code: PluginStateCode,
}

impl Plugin {
    pub(crate) fn enabled(
        hash: String,
        path: PathBuf,
        instance: PluginInstance,
        module: Module,
        sandbox: Arc<Sandbox>,
    ) -> Self {
        let name = instance.definition.name.clone();
        let methods = PluginMethods::new(
            name.clone(),
            instance.capabilities.clone(),
            Some(module),
            sandbox,
        );
        Self {
            hash,
            name,
            path,
            instance: Some(instance),
            methods,
            state: PluginState::Enabled,
            state_code: PluginStateCode::Ok,
        }
    }

    /// An `Error` record. A definition that parsed is kept so the entry
    /// still shows its version and can be updated from its `srcUrl`.
    pub(crate) fn failed(
        hash: String,
        name: String,
        path: PathBuf,
        definition: Option<PluginDefinition>,
        state_code: PluginStateCode,
        sandbox: Arc<Sandbox>,
    ) -> Self {
        let methods = PluginMethods::new(name.clone(), CapabilitySet::default(), None, sandbox);
        Self {
            hash,
            name,
            path,
            instance: definition.map(|definition| PluginInstance {
                definition,
                capabilities: CapabilitySet::default(),
            }),
            methods,
            state: PluginState::Error,
            state_code,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state == PluginState::Enabled
    }

    pub fn definition(&self) -> Option<&PluginDefinition> {
        self.instance.as_ref().map(|i| &i.definition)
    }

    pub fn version(&self) -> Option<&str> {
        self.definition().and_then(|d| d.version.as_deref())
    }

    pub fn src_url(&self) -> Option<&str> {
        self.definition().and_then(|d| d.src_url.as_deref())
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.instance
            .as_ref()
            .map(|i| i.capabilities.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("hash", &self.hash)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("version", &self.version())
            .field("state", &self.state)
            .field("state_code", &self.state_code)
            .finish()
    }
}
