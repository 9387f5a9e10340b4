// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the plugin manager, plugins, and the playback queue.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Coarse status of an installed plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PluginState {
    Enabled,
    Error,
}

/// Fine-grained reason for a plugin's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PluginStateCode {
    Ok,
    VersionNotMatch,
    CannotParse,
}

impl PluginStateCode {
    /// Short user-facing description, `None` when the plugin is healthy.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            PluginStateCode::Ok => None,
            PluginStateCode::VersionNotMatch => Some("plugin is not compatible with this app version"),
            PluginStateCode::CannotParse => Some("plugin cannot be parsed"),
        }
    }
}

/// An optional method a plugin may export.
///
/// The snake_case form is the name of the WASM export that implements it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumString,
    EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ImportMusicItem,
    ImportMusicSheet,
    Search,
    GetMediaSource,
    GetTopLists,
    GetTopListDetail,
}

/// The set of capabilities a loaded plugin implements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// Builds the set from the names a module exports, ignoring unknown names.
    pub fn from_exports<'a>(exports: impl IntoIterator<Item = &'a str>) -> Self {
        let exported: BTreeSet<&str> = exports.into_iter().collect();
        Self(
            Capability::iter()
                .filter(|c| exported.contains(c.as_ref()))
                .collect(),
        )
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A playable track as produced by plugins and consumed by the music queue.
///
/// Fields a plugin returns beyond the known ones are kept in `extra` so they
/// survive a round trip back into the same plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Name of the plugin that produced the item.
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Plugins report ids as strings or as bare JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        UInt(u64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::UInt(n) => n.to_string(),
        Id::Float(n) => n.to_string(),
    })
}

/// Requested audio quality for media resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Standard,
    High,
    Super,
}

/// Where and how to fetch the audio for a music item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage<T> {
    #[serde(default = "default_is_end")]
    pub is_end: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

fn default_is_end() -> bool {
    true
}

impl<T> Default for SearchPage<T> {
    fn default() -> Self {
        Self {
            is_end: true,
            data: Vec::new(),
        }
    }
}

/// A chart ("top list") offered by a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopListItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_img: Option<String>,
}

/// A titled group of charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopListGroup {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub data: Vec<TopListItem>,
}

/// The tracks of a single chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopListDetail {
    pub top_list_item: TopListItem,
    #[serde(default)]
    pub music_list: Vec<MusicItem>,
}

/// What happens when a track inside a list (album, chart) is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClickBehavior {
    /// Enqueue only the selected track.
    PlaySingle,
    /// Replace the queue with the whole list and start at the selected track.
    #[default]
    PlayAlbum,
}

/// Filters a music list by a free-text query over title, artist, album and platform.
///
/// An empty query returns the list unchanged.
pub fn filter_music<'a>(query: &str, list: &'a [MusicItem]) -> Vec<&'a MusicItem> {
    let query = query.trim();
    if query.is_empty() {
        return list.iter().collect();
    }
    list.iter()
        .filter(|m| {
            format!("{} {} {} {}", m.title, m.artist, m.album, m.platform).contains(query)
        })
        .collect()
}
