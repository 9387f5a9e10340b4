// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uniform dispatch over a plugin's optional capabilities.
//!
//! Callers never check capabilities themselves: a method the plugin does not
//! export answers with an empty value and the sandbox is never entered.

use std::sync::Arc;

use cadenza_core::types::{MediaSource, Quality, SearchPage, TopListDetail, TopListGroup, TopListItem};
use cadenza_core::{CadenzaError, Capability, CapabilitySet, MusicItem};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use wasmtime::Module;

use crate::sandbox::Sandbox;

pub struct PluginMethods {
    plugin: String,
    capabilities: CapabilitySet,
    module: Option<Module>,
    sandbox: Arc<Sandbox>,
}

impl PluginMethods {
    pub(crate) fn new(
        plugin: String,
        capabilities: CapabilitySet,
        module: Option<Module>,
        sandbox: Arc<Sandbox>,
    ) -> Self {
        Self {
            plugin,
            capabilities,
            module,
            sandbox,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability) && self.module.is_some()
    }

    /// Resolves a pasted link or text to a single track.
    pub async fn import_music_item(&self, text: &str) -> Result<Option<MusicItem>, CadenzaError> {
        let item: Option<MusicItem> = self
            .invoke(Capability::ImportMusicItem, &json!({ "text": text }))
            .await?
            .flatten();
        Ok(item.map(|i| self.claim(i)))
    }

    /// Resolves a pasted link or text to a track list.
    pub async fn import_music_sheet(&self, text: &str) -> Result<Vec<MusicItem>, CadenzaError> {
        let items: Vec<MusicItem> = self
            .invoke(Capability::ImportMusicSheet, &json!({ "text": text }))
            .await?
            .flatten()
            .unwrap_or_default();
        Ok(self.claim_all(items))
    }

    pub async fn search(
        &self,
        query: &str,
        page: u32,
        kind: &str,
    ) -> Result<SearchPage<MusicItem>, CadenzaError> {
        let result: Option<SearchPage<MusicItem>> = self
            .invoke(
                Capability::Search,
                &json!({ "query": query, "page": page, "type": kind }),
            )
            .await?
            .flatten();
        Ok(match result {
            Some(page) => SearchPage {
                is_end: page.is_end,
                data: self.claim_all(page.data),
            },
            None => SearchPage::default(),
        })
    }

    pub async fn get_media_source(
        &self,
        item: &MusicItem,
        quality: Quality,
    ) -> Result<Option<MediaSource>, CadenzaError> {
        Ok(self
            .invoke(
                Capability::GetMediaSource,
                &json!({ "musicItem": item, "quality": quality }),
            )
            .await?
            .flatten())
    }

    pub async fn get_top_lists(&self) -> Result<Vec<TopListGroup>, CadenzaError> {
        let groups: Vec<TopListGroup> = self
            .invoke(Capability::GetTopLists, &json!({}))
            .await?
            .flatten()
            .unwrap_or_default();
        Ok(groups
            .into_iter()
            .map(|mut g| {
                for item in &mut g.data {
                    item.platform = self.plugin.clone();
                }
                g
            })
            .collect())
    }

    pub async fn get_top_list_detail(
        &self,
        top_list: &TopListItem,
    ) -> Result<Option<TopListDetail>, CadenzaError> {
        let detail: Option<TopListDetail> = self
            .invoke(Capability::GetTopListDetail, top_list)
            .await?
            .flatten();
        Ok(detail.map(|mut d| {
            d.top_list_item.platform = self.plugin.clone();
            d.music_list = self.claim_all(d.music_list);
            d
        }))
    }

    /// `Ok(None)` when the capability is absent or the plugin wrote nothing.
    async fn invoke<I, T>(&self, capability: Capability, input: &I) -> Result<Option<T>, CadenzaError>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let Some(module) = self.module.as_ref().filter(|_| self.capabilities.contains(capability))
        else {
            return Ok(None);
        };
        let input = serde_json::to_string(input).map_err(|e| self.error(format!("failed to encode input: {e}")))?;
        let output = self
            .sandbox
            .call(&self.plugin, module, capability.as_ref(), input)
            .await
            .map_err(|e| self.error(format!("{capability} {e}")))?;
        match output {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| self.error(format!("{capability} returned invalid output: {e}"))),
        }
    }

    fn claim(&self, mut item: MusicItem) -> MusicItem {
        item.platform = self.plugin.clone();
        item
    }

    fn claim_all(&self, items: Vec<MusicItem>) -> Vec<MusicItem> {
        items.into_iter().map(|i| self.claim(i)).collect()
    }

    fn error(&self, message: String) -> CadenzaError {
        CadenzaError::Plugin {
            plugin: self.plugin.clone(),
            message,
        }
    }
}
