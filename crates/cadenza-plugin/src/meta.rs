// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed persistence for the plugin metadata document.
//!
//! The whole document lives in the `plugin_meta` table and is rewritten in a
//! single transaction on every save.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cadenza_core::{CadenzaError, MetaStore, PluginMeta, PluginMetaDoc};
use tokio_rusqlite::Connection;
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS plugin_meta (
    name TEXT PRIMARY KEY NOT NULL,
    \"order\" INTEGER NOT NULL
)";

/// Holds an `Arc<Connection>` and delegates SQL through `call()`.
pub struct SqliteMetaStore {
    conn: Arc<Connection>,
}

impl SqliteMetaStore {
    /// Opens (creating if needed) the database at `path` and ensures the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CadenzaError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(CadenzaError::storage)?;
        }
        let conn = Connection::open(path)
            .await
            .map_err(CadenzaError::storage)?;
        Self::with_connection(Arc::new(conn)).await
    }

    /// Uses an existing connection, e.g. an in-memory database in tests.
    pub async fn with_connection(conn: Arc<Connection>) -> Result<Self, CadenzaError> {
        conn.call(|conn| {
            conn.execute(SCHEMA, [])?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| CadenzaError::storage(e))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl MetaStore for SqliteMetaStore {
    async fn load(&self) -> Result<PluginMetaDoc, CadenzaError> {
        let entries = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT name, \"order\" FROM plugin_meta")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                let mut entries = BTreeMap::new();
                for row in rows {
                    let (name, order) = row?;
                    entries.insert(name, PluginMeta { order: Some(order) });
                }
                Ok(entries)
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| CadenzaError::storage(e))?;
        debug!(entries = entries.len(), "loaded plugin metadata");
        Ok(PluginMetaDoc::new(entries))
    }

    async fn save(&self, doc: &PluginMetaDoc) -> Result<(), CadenzaError> {
        let rows: Vec<(String, i64)> = doc
            .iter()
            .filter_map(|(name, meta)| meta.order.map(|o| (name.to_string(), o)))
            .collect();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM plugin_meta", [])?;
                {
                    let mut stmt =
                        tx.prepare("INSERT INTO plugin_meta (name, \"order\") VALUES (?1, ?2)")?;
                    for (name, order) in &rows {
                        stmt.execute(rusqlite::params![name, order])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|e: tokio_rusqlite::Error<rusqlite::Error>| CadenzaError::storage(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_database_loads_empty_doc() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteMetaStore::open(dir.path().join("meta.db")).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_replaces_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("meta.db");
        let store = SqliteMetaStore::open(&path).await.unwrap();

        let first = PluginMetaDoc::default().with_orders(["a", "b", "c"]);
        store.save(&first).await.unwrap();
        let second = PluginMetaDoc::default().with_orders(["c", "a"]);
        store.save(&second).await.unwrap();
        drop(store);

        let reopened = SqliteMetaStore::open(&path).await.unwrap();
        let doc = reopened.load().await.unwrap();
        assert_eq!(doc, second);
        assert!(doc.get("b").is_none());
    }
}
