// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory plugin registry with persisted ordering metadata.
//!
//! Readers load the current snapshot without locking. Every mutation goes
//! through a [`RegistryWriter`], which holds the single writer lock, persists
//! metadata first, then swaps in a freshly built list and notifies watchers.

use std::sync::Arc;

use arc_swap::ArcSwap;
use cadenza_core::{CadenzaError, MetaStore, PluginMetaDoc};
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::debug;

use crate::plugin::Plugin;

pub type PluginList = Vec<Arc<Plugin>>;

pub struct PluginRegistry {
    plugins: ArcSwap<PluginList>,
    meta: ArcSwap<PluginMetaDoc>,
    store: Arc<dyn MetaStore>,
    write_lock: Mutex<()>,
    changes: watch::Sender<PluginList>,
}

impl PluginRegistry {
    /// Creates an empty registry, reading the metadata document once.
    pub async fn open(store: Arc<dyn MetaStore>) -> Result<Self, CadenzaError> {
        let meta = store.load().await?;
        let (changes, _) = watch::channel(Vec::new());
        Ok(Self {
            plugins: ArcSwap::from_pointee(Vec::new()),
            meta: ArcSwap::from_pointee(meta),
            store,
            write_lock: Mutex::new(()),
            changes,
        })
    }

    /// Plugins in discovery order.
    pub fn snapshot(&self) -> Arc<PluginList> {
        self.plugins.load_full()
    }

    pub fn meta(&self) -> Arc<PluginMetaDoc> {
        self.meta.load_full()
    }

    pub fn get(&self, hash: &str) -> Option<Arc<Plugin>> {
        self.plugins.load().iter().find(|p| p.hash == hash).cloned()
    }

    pub fn len(&self) -> usize {
        self.plugins.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.load().is_empty()
    }

    /// Plugins ordered for display.
    pub fn sorted(&self) -> PluginList {
        sort_plugins(&self.plugins.load(), &self.meta.load())
    }

    /// Receives the sorted list after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<PluginList> {
        self.changes.subscribe()
    }

    /// Takes the writer lock. Resolve against [`RegistryWriter::snapshot`]
    /// while holding it so concurrent installs see each other.
    pub async fn write(&self) -> RegistryWriter<'_> {
        RegistryWriter {
            registry: self,
            _guard: self.write_lock.lock().await,
        }
    }

    fn publish(&self, plugins: PluginList) {
        self.plugins.store(Arc::new(plugins));
        self.changes.send_replace(self.sorted());
    }
}

/// Exclusive mutation handle; dropping it releases the lock.
pub struct RegistryWriter<'a> {
    registry: &'a PluginRegistry,
    _guard: MutexGuard<'a, ()>,
}

impl RegistryWriter<'_> {
    pub fn snapshot(&self) -> Arc<PluginList> {
        self.registry.snapshot()
    }

    pub fn meta(&self) -> Arc<PluginMetaDoc> {
        self.registry.meta()
    }

    /// Appends `plugin`. A name with no recorded order goes to the end.
    pub async fn insert(&self, plugin: Plugin) -> Result<Arc<Plugin>, CadenzaError> {
        if let Some(next) = self.registry.meta().with_appended(&plugin.name) {
            self.save_meta(next).await?;
        }
        let plugin = Arc::new(plugin);
        let mut list = (*self.snapshot()).clone();
        list.push(plugin.clone());
        self.registry.publish(list);
        Ok(plugin)
    }

    /// Swaps the record with hash `old` for `plugin`, keeping its position.
    ///
    /// A renamed replacement with no order of its own inherits the order of
    /// the record it replaces.
    pub async fn replace(&self, old: &str, plugin: Plugin) -> Result<Arc<Plugin>, CadenzaError> {
        let meta = self.registry.meta();
        let inherited = self
            .snapshot()
            .iter()
            .find(|p| p.hash == old)
            .and_then(|p| meta.order_of(&p.name));
        let next = match inherited {
            Some(order) if meta.order_of(&plugin.name).is_none() => {
                Some(meta.with_order(&plugin.name, order))
            }
            _ => meta.with_appended(&plugin.name),
        };
        if let Some(next) = next {
            self.save_meta(next).await?;
        }
        let plugin = Arc::new(plugin);
        let mut list = (*self.snapshot()).clone();
        match list.iter().position(|p| p.hash == old) {
            Some(idx) => list[idx] = plugin.clone(),
            None => list.push(plugin.clone()),
        }
        self.registry.publish(list);
        Ok(plugin)
    }

    /// Removes the record with `hash`. Metadata for its name is kept.
    pub fn remove(&self, hash: &str) -> Option<Arc<Plugin>> {
        let current = self.snapshot();
        let removed = current.iter().find(|p| p.hash == hash).cloned()?;
        let list = current
            .iter()
            .filter(|p| p.hash != hash)
            .cloned()
            .collect();
        self.registry.publish(list);
        Some(removed)
    }

    /// Empties the registry and the metadata document.
    pub async fn clear(&self) -> Result<PluginList, CadenzaError> {
        self.save_meta(PluginMetaDoc::default()).await?;
        let previous = (*self.snapshot()).clone();
        self.registry.publish(Vec::new());
        Ok(previous)
    }

    /// Replaces the whole list, used when restoring from disk.
    pub fn restore(&self, plugins: Vec<Plugin>) {
        let list = plugins.into_iter().map(Arc::new).collect();
        self.registry.publish(list);
    }

    /// Persists a new metadata document, then makes it current.
    pub async fn save_meta(&self, doc: PluginMetaDoc) -> Result<(), CadenzaError> {
        self.registry.store.save(&doc).await?;
        debug!(entries = doc.len(), "saved plugin metadata");
        self.registry.meta.store(Arc::new(doc));
        self.registry
            .changes
            .send_replace(self.registry.sorted());
        Ok(())
    }

    /// Reloads the metadata document from the store.
    pub async fn reload_meta(&self) -> Result<(), CadenzaError> {
        let doc = self.registry.store.load().await?;
        self.registry.meta.store(Arc::new(doc));
        Ok(())
    }
}

/// Ordered entries first by `order`, then unordered ones in discovery order.
pub fn sort_plugins(plugins: &[Arc<Plugin>], meta: &PluginMetaDoc) -> PluginList {
    let mut sorted = plugins.to_vec();
    sorted.sort_by_key(|p| match meta.order_of(&p.name) {
        Some(order) => (false, order),
        None => (true, 0),
    });
    sorted
}
