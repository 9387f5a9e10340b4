// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording playback queue.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use cadenza_core::{CadenzaError, MusicItem, MusicQueue};

/// One request the queue received.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueCall {
    Play(MusicItem),
    ReplaceQueue { item: MusicItem, list: Vec<MusicItem> },
}

/// A [`MusicQueue`] that only remembers what it was asked to do.
#[derive(Clone, Default)]
pub struct MockQueue {
    calls: Arc<Mutex<Vec<QueueCall>>>,
}

impl MockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<QueueCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl MusicQueue for MockQueue {
    async fn play(&self, item: MusicItem) -> Result<(), CadenzaError> {
        self.calls.lock().await.push(QueueCall::Play(item));
        Ok(())
    }

    async fn play_with_replace_queue(
        &self,
        item: MusicItem,
        list: Vec<MusicItem>,
    ) -> Result<(), CadenzaError> {
        self.calls
            .lock()
            .await
            .push(QueueCall::ReplaceQueue { item, list });
        Ok(())
    }
}
