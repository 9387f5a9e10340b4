// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A playback queue that reports to the terminal.
//!
//! The CLI has no audio engine; it shows what the engine would be asked to do.

use async_trait::async_trait;
use cadenza_core::{CadenzaError, MusicItem, MusicQueue};
use tracing::info;

pub struct ConsoleQueue;

fn label(item: &MusicItem) -> String {
    if item.title.is_empty() {
        format!("{} ({})", item.id, item.platform)
    } else {
        format!("{} - {} ({})", item.title, item.artist, item.platform)
    }
}

#[async_trait]
impl MusicQueue for ConsoleQueue {
    async fn play(&self, item: MusicItem) -> Result<(), CadenzaError> {
        info!(id = %item.id, platform = %item.platform, "play");
        println!("now playing: {}", label(&item));
        Ok(())
    }

    async fn play_with_replace_queue(
        &self,
        item: MusicItem,
        list: Vec<MusicItem>,
    ) -> Result<(), CadenzaError> {
        info!(id = %item.id, queued = list.len(), "replace queue");
        println!("queue replaced with {} track(s)", list.len());
        println!("now playing: {}", label(&item));
        Ok(())
    }
}
