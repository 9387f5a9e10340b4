// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content identity and install/update resolution.

use std::sync::Arc;

use cadenza_core::CadenzaError;
use sha2::{Digest, Sha256};

use crate::plugin::Plugin;

/// Lowercase hex SHA-256 of the raw source bytes.
pub fn content_hash(source: &[u8]) -> String {
    hex::encode(Sha256::digest(source))
}

/// What committing a freshly loaded plugin would do to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveAction {
    /// Nothing with this hash or name is installed.
    Install,
    /// A plugin with the same name but different content is installed.
    Update { replaces: String },
    /// Byte-identical content is already installed.
    Unchanged,
}

impl std::fmt::Display for ResolveAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveAction::Install => f.write_str("installed"),
            ResolveAction::Update { .. } => f.write_str("updated"),
            ResolveAction::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Hash match wins over name match.
pub fn resolve(hash: &str, name: &str, installed: &[Arc<Plugin>]) -> ResolveAction {
    if installed.iter().any(|p| p.hash == hash) {
        return ResolveAction::Unchanged;
    }
    match installed.iter().find(|p| p.name == name) {
        Some(existing) => ResolveAction::Update {
            replaces: existing.hash.clone(),
        },
        None => ResolveAction::Install,
    }
}

/// Resolution for an explicit update of the record `target`.
///
/// New content always replaces `target`, whatever name it declares. Falls
/// back to [`resolve`] when `target` is no longer installed.
pub fn resolve_update(
    hash: &str,
    name: &str,
    target: &str,
    installed: &[Arc<Plugin>],
) -> ResolveAction {
    if installed.iter().any(|p| p.hash == hash) {
        return ResolveAction::Unchanged;
    }
    if installed.iter().any(|p| p.hash == target) {
        return ResolveAction::Update {
            replaces: target.to_string(),
        };
    }
    resolve(hash, name, installed)
}

/// Refuses to replace `installed` with an older `candidate`.
///
/// Versions that do not parse as semver are not compared.
pub fn check_downgrade(
    name: &str,
    installed: Option<&str>,
    candidate: Option<&str>,
) -> Result<(), CadenzaError> {
    let (Some(installed), Some(candidate)) = (installed, candidate) else {
        return Ok(());
    };
    let (Ok(old), Ok(new)) = (
        semver::Version::parse(installed.trim()),
        semver::Version::parse(candidate.trim()),
    ) else {
        return Ok(());
    };
    if old > new {
        return Err(CadenzaError::NewerVersionInstalled {
            name: name.to_string(),
            installed: installed.to_string(),
            candidate: candidate.to_string(),
        });
    }
    Ok(())
}
