//! SQLite storage backend
//!
//! Provides `SqliteStore` - a shared SQLite connection wrapper that
//! implements `CatalogStore`. Every transaction runs inside a SQLite
//! transaction: committed when the closure succeeds, rolled back otherwise.
//!
//! Submodules:
//! - `graph` - `Graph` impl over a connection

use anyhow::{Result, anyhow};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use crate::storage::traits::{CatalogStore, Graph};

mod graph;

pub use graph::SqliteGraph;
pub(crate) use graph::init_schema as init_graph_schema;

/// Shared SQLite connection
///
/// Create one store and share it via `Arc` across all components that need
/// database access.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(&path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("sqlite connection lock poisoned"))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        init_graph_schema(&conn)?;
        Ok(())
    }
}

impl CatalogStore for SqliteStore {
    fn read<T, E>(&self, f: impl FnOnce(&dyn Graph) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let conn = self.lock()?;
        let graph = SqliteGraph::new(&conn);
        f(&graph)
    }

    fn transaction<T, E>(&self, f: impl FnOnce(&mut dyn Graph) -> Result<T, E>) -> Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(anyhow::Error::from)?;
        let result = {
            let mut graph = SqliteGraph::new(&tx);
            f(&mut graph)
        };

        match result {
            Ok(value) => {
                tx.commit().map_err(anyhow::Error::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    warn!("Failed to roll back sqlite transaction: {}", rollback);
                }
                Err(e)
            }
        }
    }
}
