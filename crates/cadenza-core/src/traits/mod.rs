// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the plugin manager.
//!
//! Each trait uses `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>`.

pub mod meta;
pub mod queue;

pub use meta::MetaStore;
pub use queue::{MusicQueue, play_from_list};
