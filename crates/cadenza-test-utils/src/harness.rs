// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Isolated on-disk environment for manager tests.

use std::path::{Path, PathBuf};

use cadenza_config::CadenzaConfig;
use tempfile::TempDir;

use crate::fixture::PluginFixture;

/// A temp directory holding the plugin dir, the metadata database, and a
/// scratch area for plugin sources. Removed on drop.
pub struct TestEnv {
    dir: TempDir,
    config: CadenzaConfig,
}

impl TestEnv {
    /// Sandbox limits are tightened and private hosts allowed so plugins
    /// can reach a local mock server.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let mut config = CadenzaConfig::default();
        config.plugin.dir = dir.path().join("plugins").display().to_string();
        config.plugin.database_path = dir.path().join("cadenza.db").display().to_string();
        config.plugin.fetch_timeout_secs = 5;
        config.sandbox.fuel = 50_000_000;
        config.sandbox.memory_mb = 8;
        config.sandbox.epoch_timeout_secs = 5;
        config.sandbox.allow_private_hosts = true;
        std::fs::create_dir_all(dir.path().join("sources")).expect("create sources dir");
        Self { dir, config }
    }

    pub fn config(&self) -> &CadenzaConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CadenzaConfig {
        &mut self.config
    }

    pub fn plugin_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.plugin.dir)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `fixture` as text into the scratch area, outside the plugin dir.
    pub fn write_source(&self, file_name: &str, fixture: &PluginFixture) -> PathBuf {
        fixture.write_wat(&self.dir.path().join("sources"), file_name)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
