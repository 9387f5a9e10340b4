// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Cadenza integration tests.
//!
//! - [`PluginFixture`] - builds WAT plugins with a chosen definition and capabilities
//! - [`MockQueue`] - playback queue that records what it was asked to play
//! - [`TestEnv`] - temp directories and a config pointing into them

pub mod fixture;
pub mod harness;
pub mod mock_queue;

pub use fixture::PluginFixture;
pub use harness::TestEnv;
pub use mock_queue::{MockQueue, QueueCall};
