// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The public plugin management API.
//!
//! Every install path funnels into one pipeline: fetch, load, resolve
//! against the registry under its writer lock, store the source file, commit.
//! Failed loads are rejected without touching the registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cadenza_config::{CadenzaConfig, PluginConfig};
use cadenza_core::{CadenzaError, Capability, MetaStore, MusicItem};
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::fetcher::{Fetcher, Locator, add_cache_buster, strip_fragment};
use crate::identity::{ResolveAction, check_downgrade, resolve, resolve_update};
use crate::loader::{LoadFailure, PluginLoader};
use crate::meta::SqliteMetaStore;
use crate::plugin::Plugin;
use crate::registry::{PluginList, PluginRegistry};
use crate::sandbox::Sandbox;
use crate::subscription::{is_manifest_locator, parse_manifest};

const WASM_MAGIC: &[u8] = b"\0asm";

/// Result of one successful install.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub hash: String,
    pub name: String,
    pub action: ResolveAction,
}

/// Per-URL outcomes of a fully successful batch install.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<(String, InstallOutcome)>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &InstallOutcome> {
        self.entries.iter().map(|(_, o)| o)
    }
}

pub struct PluginManager {
    config: PluginConfig,
    plugin_dir: PathBuf,
    fetcher: Fetcher,
    loader: PluginLoader,
    sandbox: Arc<Sandbox>,
    registry: PluginRegistry,
}

impl PluginManager {
    /// Opens the metadata database named in the config.
    pub async fn new(config: &CadenzaConfig) -> Result<Self, CadenzaError> {
        let store = SqliteMetaStore::open(&config.plugin.database_path).await?;
        Self::with_meta_store(config, Arc::new(store)).await
    }

    pub async fn with_meta_store(
        config: &CadenzaConfig,
        store: Arc<dyn MetaStore>,
    ) -> Result<Self, CadenzaError> {
        let sandbox = Arc::new(Sandbox::new(&config.sandbox)?);
        let loader = PluginLoader::new(sandbox.clone())?;
        Self::assemble(config, store, sandbox, loader).await
    }

    /// Like [`with_meta_store`](Self::with_meta_store) with an explicit host version.
    pub async fn with_host_version(
        config: &CadenzaConfig,
        store: Arc<dyn MetaStore>,
        host_version: semver::Version,
    ) -> Result<Self, CadenzaError> {
        let sandbox = Arc::new(Sandbox::new(&config.sandbox)?);
        let loader = PluginLoader::with_host_version(sandbox.clone(), host_version);
        Self::assemble(config, store, sandbox, loader).await
    }

    async fn assemble(
        config: &CadenzaConfig,
        store: Arc<dyn MetaStore>,
        sandbox: Arc<Sandbox>,
        loader: PluginLoader,
    ) -> Result<Self, CadenzaError> {
        let plugin_dir = PathBuf::from(&config.plugin.dir);
        tokio::fs::create_dir_all(&plugin_dir)
            .await
            .map_err(CadenzaError::storage)?;
        Ok(Self {
            config: config.plugin.clone(),
            plugin_dir,
            fetcher: Fetcher::new(&config.plugin)?,
            loader,
            sandbox,
            registry: PluginRegistry::open(store).await?,
        })
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn plugin(&self, hash: &str) -> Option<Arc<Plugin>> {
        self.registry.get(hash)
    }

    pub fn sorted_plugins(&self) -> PluginList {
        self.registry.sorted()
    }

    pub fn subscribe(&self) -> watch::Receiver<PluginList> {
        self.registry.subscribe()
    }

    /// Restores every stored plugin from the plugin directory.
    ///
    /// Sources that no longer load are kept as `Error` entries so they stay
    /// visible and uninstallable. Returns the number of entries restored.
    pub async fn load_installed(&self) -> Result<usize, CadenzaError> {
        let mut dir = tokio::fs::read_dir(&self.plugin_dir)
            .await
            .map_err(CadenzaError::storage)?;
        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(CadenzaError::storage)? {
            let path = entry.path();
            if self.has_source_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut restored = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable plugin file");
                    continue;
                }
            };
            match self.loader.load(&bytes, None).await {
                Ok(loaded) => restored.push(Plugin::enabled(
                    loaded.hash,
                    path,
                    loaded.instance,
                    loaded.module,
                    self.sandbox.clone(),
                )),
                Err(failure) => {
                    let state_code = failure.state_code();
                    let name = failure.name.clone().unwrap_or_else(|| file_stem(&path));
                    warn!(
                        plugin = %name,
                        state_code = %state_code,
                        error = %failure.error,
                        "restored plugin in error state"
                    );
                    restored.push(Plugin::failed(
                        failure.hash,
                        name,
                        path,
                        failure.definition,
                        state_code,
                        self.sandbox.clone(),
                    ));
                }
            }
        }

        let count = restored.len();
        let writer = self.registry.write().await;
        writer.reload_meta().await?;
        writer.restore(restored);
        info!(count, "restored installed plugins");
        Ok(count)
    }

    /// Installs from a local file with one of the configured extensions.
    pub async fn install_plugin(&self, path: impl AsRef<Path>) -> Result<InstallOutcome, CadenzaError> {
        let locator = match Locator::parse(&path.as_ref().to_string_lossy()) {
            Locator::Url(url) => return self.install_plugin_from_url(&url).await,
            file => file,
        };
        if let Locator::File(file) = &locator
            && !self.has_source_extension(file)
        {
            return Err(CadenzaError::Fetch {
                locator: locator.to_string(),
                message: format!(
                    "expected a file ending in one of: {}",
                    self.config.source_extensions.join(", ")
                ),
                source: None,
            });
        }
        let source = self.fetcher.fetch(&locator).await?;
        self.install_source(&source, None, &locator.to_string(), None)
            .await
    }

    /// Installs from a URL. A cache-busting fragment is added before fetching.
    pub async fn install_plugin_from_url(&self, url: &str) -> Result<InstallOutcome, CadenzaError> {
        let url = add_cache_buster(url.trim());
        let locator = Locator::Url(url.clone());
        let source = self.fetcher.fetch(&locator).await?;
        self.install_source(&source, Some(&url), strip_fragment(&url), None)
            .await
    }

    /// Installs a single URL or every URL of a `.json` manifest, concurrently.
    ///
    /// Successful installs stay committed even when siblings fail.
    pub async fn install_from_subscription(&self, locator: &str) -> Result<BatchReport, CadenzaError> {
        let locator = locator.trim();
        let urls = if is_manifest_locator(locator) {
            let manifest = self.fetcher.fetch_text(&manifest_locator(locator)).await?;
            parse_manifest(&manifest)?
                .iter()
                .map(|u| add_cache_buster(u))
                .collect()
        } else {
            vec![locator.to_string()]
        };

        let total = urls.len();
        let results = join_all(urls.iter().map(|u| self.install_plugin_from_url(u))).await;

        let mut report = BatchReport::default();
        let mut failures = Vec::new();
        for (url, result) in urls.into_iter().zip(results) {
            match result {
                Ok(outcome) => report
                    .entries
                    .push((strip_fragment(&url).to_string(), outcome)),
                Err(e) => {
                    warn!(url = %url, error = %e, "subscription install failed");
                    failures.push(format!("{}: {e}", strip_fragment(&url)));
                }
            }
        }

        if failures.is_empty() {
            info!(locator, total, "subscription installed");
            Ok(report)
        } else {
            Err(CadenzaError::AggregateInstall { failures, total })
        }
    }

    /// Installs from the configured `plugin.subscribe_url`.
    pub async fn sync_subscription(&self) -> Result<BatchReport, CadenzaError> {
        let locator = self
            .config
            .subscribe_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| CadenzaError::Config("plugin.subscribe_url is not set".to_string()))?;
        self.install_from_subscription(&locator).await
    }

    /// Re-fetches a plugin from its source URL.
    ///
    /// Different content always replaces this record, even when it now
    /// declares another name. `Error` records that kept their definition are
    /// updatable too.
    pub async fn update_plugin(&self, hash: &str) -> Result<InstallOutcome, CadenzaError> {
        let plugin = self
            .registry
            .get(hash)
            .ok_or_else(|| CadenzaError::PluginNotFound {
                hash: hash.to_string(),
            })?;
        let src_url = plugin
            .src_url()
            .ok_or_else(|| CadenzaError::NotUpdatable {
                name: plugin.name.clone(),
            })?
            .to_string();
        let url = add_cache_buster(src_url.trim());
        let source = self.fetcher.fetch(&Locator::Url(url.clone())).await?;
        self.install_source(&source, Some(&url), strip_fragment(&url), Some(hash))
            .await
    }

    /// Removes the record and its stored file.
    ///
    /// The file is deleted under the writer lock so a concurrent reinstall of
    /// the same content cannot lose its freshly stored file.
    pub async fn uninstall_plugin(&self, hash: &str) -> Result<(), CadenzaError> {
        let writer = self.registry.write().await;
        let removed = writer.remove(hash).ok_or_else(|| CadenzaError::PluginNotFound {
            hash: hash.to_string(),
        })?;
        remove_source_file(&removed.path).await;
        drop(writer);
        info!(plugin = %removed.name, hash = %removed.hash, "plugin uninstalled");
        Ok(())
    }

    /// Removes every plugin, its stored file, and all metadata.
    pub async fn uninstall_all_plugins(&self) -> Result<(), CadenzaError> {
        let writer = self.registry.write().await;
        let removed = writer.clear().await?;
        for plugin in &removed {
            remove_source_file(&plugin.path).await;
        }
        drop(writer);
        info!(count = removed.len(), "all plugins uninstalled");
        Ok(())
    }

    /// Gives each listed name its index as display order.
    pub async fn reorder<S: AsRef<str>>(&self, names: &[S]) -> Result<(), CadenzaError> {
        let writer = self.registry.write().await;
        let next = writer.meta().with_orders(names.iter().map(|n| n.as_ref()));
        writer.save_meta(next).await
    }

    /// Asks each enabled plugin, in display order, to import a single track.
    pub async fn import_music_item(&self, text: &str) -> Result<Option<MusicItem>, CadenzaError> {
        let mut first_error = None;
        for plugin in self.providers(Capability::ImportMusicItem) {
            match plugin.methods.import_music_item(text).await {
                Ok(Some(item)) => return Ok(Some(item)),
                Ok(None) => {}
                Err(e) => {
                    warn!(plugin = %plugin.name, error = %e, "import_music_item failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Asks each enabled plugin, in display order, to import a track list.
    pub async fn import_music_sheet(&self, text: &str) -> Result<Vec<MusicItem>, CadenzaError> {
        let mut first_error = None;
        for plugin in self.providers(Capability::ImportMusicSheet) {
            match plugin.methods.import_music_sheet(text).await {
                Ok(items) if !items.is_empty() => return Ok(items),
                Ok(_) => {}
                Err(e) => {
                    warn!(plugin = %plugin.name, error = %e, "import_music_sheet failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    fn providers(&self, capability: Capability) -> PluginList {
        self.registry
            .sorted()
            .into_iter()
            .filter(|p| p.is_enabled() && p.methods.has(capability))
            .collect()
    }

    async fn install_source(
        &self,
        source: &[u8],
        source_url: Option<&str>,
        origin: &str,
        target: Option<&str>,
    ) -> Result<InstallOutcome, CadenzaError> {
        let loaded = self
            .loader
            .load(source, source_url)
            .await
            .map_err(|failure: LoadFailure| {
                warn!(
                    origin,
                    hash = %failure.hash,
                    state_code = %failure.state_code(),
                    error = %failure.error,
                    "plugin rejected"
                );
                failure.error
            })?;
        let name = loaded.instance.definition.name.clone();
        let hash = loaded.hash.clone();

        let writer = self.registry.write().await;
        let action = match target {
            Some(target) => resolve_update(&hash, &name, target, &writer.snapshot()),
            None => resolve(&hash, &name, &writer.snapshot()),
        };

        let outcome = InstallOutcome {
            hash: hash.clone(),
            name: name.clone(),
            action: action.clone(),
        };

        let mut replaced_path = None;
        match &action {
            ResolveAction::Unchanged => {
                debug!(plugin = %name, hash = %hash, "plugin already installed");
                return Ok(outcome);
            }
            ResolveAction::Update { replaces } => {
                if let Some(current) = writer.snapshot().iter().find(|p| &p.hash == replaces) {
                    check_downgrade(
                        &name,
                        current.version(),
                        loaded.instance.definition.version.as_deref(),
                    )?;
                    replaced_path = Some(current.path.clone());
                }
            }
            ResolveAction::Install => {}
        }

        let path = self.store_source(&hash, source).await?;
        let plugin = Plugin::enabled(
            hash.clone(),
            path.clone(),
            loaded.instance,
            loaded.module,
            self.sandbox.clone(),
        );

        let committed = match &action {
            ResolveAction::Update { replaces } => writer.replace(replaces, plugin).await,
            _ => writer.insert(plugin).await,
        };
        if let Err(e) = committed {
            remove_source_file(&path).await;
            return Err(e);
        }
        if let Some(old) = replaced_path.filter(|old| *old != path) {
            remove_source_file(&old).await;
        }
        drop(writer);

        if let ResolveAction::Update { replaces } = &action {
            info!(plugin = %name, hash = %hash, replaces = %replaces, origin, "plugin updated");
        } else {
            info!(plugin = %name, hash = %hash, origin, "plugin installed");
        }
        Ok(outcome)
    }

    /// Writes the source to `<plugin_dir>/<hash>.<ext>` via a temp file.
    async fn store_source(&self, hash: &str, source: &[u8]) -> Result<PathBuf, CadenzaError> {
        let path = self.source_path(hash, source);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, source)
            .await
            .map_err(CadenzaError::storage)?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(CadenzaError::storage)?;
        Ok(path)
    }

    fn source_path(&self, hash: &str, source: &[u8]) -> PathBuf {
        let ext = if source.starts_with(WASM_MAGIC) { "wasm" } else { "wat" };
        self.plugin_dir.join(format!("{hash}.{ext}"))
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.config
                    .source_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

/// Remote manifests are cache-busted like every other remote locator.
fn manifest_locator(locator: &str) -> Locator {
    match Locator::parse(locator) {
        Locator::Url(url) => Locator::Url(add_cache_buster(&url)),
        file => file,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn remove_source_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove plugin file"),
    }
}
