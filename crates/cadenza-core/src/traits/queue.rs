// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback queue collaborator.

use async_trait::async_trait;

use crate::error::CadenzaError;
use crate::types::{ClickBehavior, MusicItem};

/// The two entry points the playback engine exposes to the plugin layer.
#[async_trait]
pub trait MusicQueue: Send + Sync {
    /// Enqueues a single resolved item and starts playing it.
    async fn play(&self, item: MusicItem) -> Result<(), CadenzaError>;

    /// Replaces the whole queue with `list` and starts playback at `item`.
    async fn play_with_replace_queue(
        &self,
        item: MusicItem,
        list: Vec<MusicItem>,
    ) -> Result<(), CadenzaError>;
}

/// Plays a track selected from inside a list according to the user's preference.
///
/// An empty `list` falls back to a queue holding just `item`.
pub async fn play_from_list(
    queue: &dyn MusicQueue,
    behavior: ClickBehavior,
    item: MusicItem,
    list: Vec<MusicItem>,
) -> Result<(), CadenzaError> {
    match behavior {
        ClickBehavior::PlaySingle => queue.play(item).await,
        ClickBehavior::PlayAlbum => {
            let list = if list.is_empty() {
                vec![item.clone()]
            } else {
                list
            };
            queue.play_with_replace_queue(item, list).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl MusicQueue for Recorder {
        async fn play(&self, item: MusicItem) -> Result<(), CadenzaError> {
            self.calls.lock().await.push((item.id, 1));
            Ok(())
        }

        async fn play_with_replace_queue(
            &self,
            item: MusicItem,
            list: Vec<MusicItem>,
        ) -> Result<(), CadenzaError> {
            self.calls.lock().await.push((item.id, list.len()));
            Ok(())
        }
    }

    fn item(id: &str) -> MusicItem {
        serde_json::from_value(serde_json::json!({ "id": id })).unwrap()
    }

    #[tokio::test]
    async fn play_single_enqueues_only_the_item() {
        let queue = Recorder::default();
        play_from_list(&queue, ClickBehavior::PlaySingle, item("a"), vec![item("a"), item("b")])
            .await
            .unwrap();
        assert_eq!(*queue.calls.lock().await, vec![("a".to_string(), 1)]);
    }

    #[tokio::test]
    async fn play_album_replaces_queue() {
        let queue = Recorder::default();
        play_from_list(&queue, ClickBehavior::PlayAlbum, item("b"), vec![item("a"), item("b")])
            .await
            .unwrap();
        assert_eq!(*queue.calls.lock().await, vec![("b".to_string(), 2)]);
    }

    #[tokio::test]
    async fn play_album_with_empty_list_uses_item() {
        let queue = Recorder::default();
        play_from_list(&queue, ClickBehavior::PlayAlbum, item("c"), Vec::new())
            .await
            .unwrap();
        assert_eq!(*queue.calls.lock().await, vec![("c".to_string(), 1)]);
    }
}
