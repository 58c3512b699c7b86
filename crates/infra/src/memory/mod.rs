//! In-memory store with an optional JSON data file.
//!
//! All transactions are serialized by one async mutex. A transaction keeps the
//! lock for its whole life, takes a copy of the tables before its first write,
//! and puts that copy back if it is dropped without committing. That copy
//! clones every table, so the first write of each transaction costs time and
//! memory proportional to the whole store, not to what the transaction
//! touches; read-only transactions copy nothing. When a data
//! file is configured, commit writes the new state to it (write to a temporary
//! file, then rename) before releasing the lock; a failed write aborts the
//! commit.

mod repos;
mod tables;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::repository::{Database, Transaction};

pub use tables::Tables;

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<Tables>>,
    data_file: Option<PathBuf>,
}

impl MemoryDatabase {
    /// Empty, purely in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by `path`: loads it when present, and rewrites it after
    /// every commit.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let tables = if tokio::fs::try_exists(&path).await? {
            let bytes = tokio::fs::read(&path).await?;
            let tables: Tables = serde_json::from_slice(&bytes)?;
            info!(
                path = %path.display(),
                customers = tables.customers.len(),
                products = tables.products.len(),
                invoices = tables.invoices.len(),
                "loaded data file"
            );
            tables
        } else {
            info!(path = %path.display(), "data file not found, starting empty");
            Tables::default()
        };

        Ok(Self {
            state: Arc::new(Mutex::new(tables)),
            data_file: Some(path),
        })
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> Tables {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard,
            undo: None,
            data_file: self.data_file.clone(),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn data_file(&self) -> Option<PathBuf> {
        self.data_file.clone()
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    /// Committed state, captured before the first write.
    undo: Option<Tables>,
    data_file: Option<PathBuf>,
}

impl MemoryTransaction {
    fn read(&self) -> &Tables {
        &self.guard
    }

    fn write(&mut self) -> &mut Tables {
        if self.undo.is_none() {
            self.undo = Some(self.guard.clone());
        }
        &mut self.guard
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            debug!("rolling back in-memory transaction");
            *self.guard = undo;
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut tx = self;
        if tx.undo.is_none() {
            return Ok(());
        }
        if let Some(path) = &tx.data_file {
            save(path, &tx.guard).await?;
        }
        tx.undo = None;
        Ok(())
    }
}

async fn save(path: &Path, tables: &Tables) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(tables)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "data file written");
    Ok(())
}
