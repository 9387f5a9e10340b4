// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription manifests: `{ "plugins": [ { "version"?, "url"? } ] }`.

use cadenza_core::CadenzaError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    plugins: Option<Vec<serde_json::Value>>,
}

/// A subscription locator names a manifest when it ends in `.json`.
pub fn is_manifest_locator(locator: &str) -> bool {
    locator.trim().ends_with(".json")
}

/// Install URLs listed by the manifest, in manifest order.
///
/// Only `url` is read; entries without a usable one are dropped. Other
/// keys, `version` included, may hold anything.
pub fn parse_manifest(json: &str) -> Result<Vec<String>, CadenzaError> {
    let manifest: Manifest =
        serde_json::from_str(json).map_err(|e| CadenzaError::Subscription {
            message: e.to_string(),
        })?;
    Ok(manifest
        .plugins
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| {
            entry
                .get("url")
                .and_then(serde_json::Value::as_str)
                .map(|url| url.trim().to_string())
        })
        .filter(|url| !url.is_empty())
        .collect())
}
