// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted per-plugin user preferences.
//!
//! The document is keyed by plugin *name*, not by content hash, so a user's
//! ordering survives updates and reinstalls of the same logical plugin.
//! Every edit produces a new document; nothing is mutated in place.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CadenzaError;

/// Preferences stored for a single plugin name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMeta {
    pub order: Option<i64>,
}

/// The full name-keyed metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetaDoc(BTreeMap<String, PluginMeta>);

impl PluginMetaDoc {
    pub fn new(entries: BTreeMap<String, PluginMeta>) -> Self {
        Self(entries)
    }

    pub fn get(&self, name: &str) -> Option<&PluginMeta> {
        self.0.get(name)
    }

    /// Explicit display order for `name`, if one was ever recorded.
    pub fn order_of(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(|m| m.order)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PluginMeta)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy where each name in `names` is ordered by its position.
    ///
    /// Names not listed keep whatever they had.
    pub fn with_orders<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut next = self.0.clone();
        for (idx, name) in names.into_iter().enumerate() {
            next.entry(name.to_string()).or_default().order = Some(idx as i64);
        }
        Self(next)
    }

    /// Returns a copy where `name` has exactly `order`.
    pub fn with_order(&self, name: &str, order: i64) -> Self {
        let mut next = self.0.clone();
        next.entry(name.to_string()).or_default().order = Some(order);
        Self(next)
    }

    /// Returns a copy where `name` is placed after every ordered entry,
    /// or `None` when `name` already has an order.
    pub fn with_appended(&self, name: &str) -> Option<Self> {
        if self.order_of(name).is_some() {
            return None;
        }
        let order = self.0.values().filter_map(|m| m.order).max().map_or(0, |max| max + 1);
        let mut next = self.0.clone();
        next.entry(name.to_string()).or_default().order = Some(order);
        Some(Self(next))
    }
}

/// Durable storage for the metadata document.
///
/// `save` replaces the whole stored document atomically: a concurrent
/// `load` sees either the previous or the new document.
#[async_trait]
pub trait MetaStore: Send + Sync {
    async fn load(&self) -> Result<PluginMetaDoc, CadenzaError>;

    async fn save(&self, doc: &PluginMetaDoc) -> Result<(), CadenzaError>;
}
