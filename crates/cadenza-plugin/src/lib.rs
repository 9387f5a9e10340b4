// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin management for the Cadenza music player.
//!
//! Plugins are WebAssembly modules that add music sources. This crate fetches
//! them, runs them in a wasmtime sandbox, deduplicates them by content hash,
//! keeps the installed set with user ordering, and dispatches calls to their
//! optional capabilities.

pub mod fetcher;
pub mod identity;
pub mod loader;
pub mod manager;
pub mod meta;
pub mod methods;
pub mod plugin;
pub mod registry;
pub mod sandbox;
pub mod subscription;

pub use fetcher::{Fetcher, Locator, add_cache_buster};
pub use identity::{ResolveAction, content_hash};
pub use loader::{HOST_VERSION, LoadFailure, LoadedPlugin, PluginLoader};
pub use manager::{BatchReport, InstallOutcome, PluginManager};
pub use meta::SqliteMetaStore;
pub use methods::PluginMethods;
pub use plugin::{Plugin, PluginDefinition, PluginInstance};
pub use registry::{PluginList, PluginRegistry};
pub use sandbox::{Sandbox, SandboxError};
pub use subscription::parse_manifest;
