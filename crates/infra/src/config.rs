//! Configuration loading and store wiring.

use std::path::PathBuf;
use std::sync::Arc;

use shopbooks_core::DomainError;
use shopbooks_inventory::OversellPolicy;

use crate::error::StoreResult;
use crate::memory::MemoryDatabase;
use crate::repository::Database;
use crate::service::BackOffice;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_BACKUP_DIR: &str = "backup";

/// Process configuration, read from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `BIND_ADDR`
    pub bind_addr: String,
    /// `DATA_FILE`: JSON data file for the in-memory store.
    pub data_file: Option<PathBuf>,
    /// `BACKUP_DIR`
    pub backup_dir: PathBuf,
    /// `OVERSELL_POLICY`: `permit` or `reject`.
    pub oversell: OversellPolicy,
    /// `USE_PERSISTENT_STORES`
    pub use_persistent_stores: bool,
    /// `DATABASE_URL`
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_file: None,
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            oversell: OversellPolicy::default(),
            use_persistent_stores: false,
            database_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let oversell = match get("OVERSELL_POLICY") {
            Some(raw) => raw.parse()?,
            None => defaults.oversell,
        };
        let use_persistent_stores = match get("USE_PERSISTENT_STORES") {
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                DomainError::validation(format!("USE_PERSISTENT_STORES must be true or false, got '{raw}'"))
            })?,
            None => false,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            data_file: get("DATA_FILE").map(PathBuf::from),
            backup_dir: get("BACKUP_DIR").map(PathBuf::from).unwrap_or(defaults.backup_dir),
            oversell,
            use_persistent_stores,
            database_url: get("DATABASE_URL"),
        })
    }

    /// Open the configured store.
    ///
    /// `USE_PERSISTENT_STORES=true` selects PostgreSQL when the `postgres`
    /// feature is compiled in; otherwise the in-memory store is used, backed by
    /// `DATA_FILE` when set.
    pub async fn open_database(&self) -> StoreResult<Arc<dyn Database>> {
        if self.use_persistent_stores {
            #[cfg(feature = "postgres")]
            {
                let url = self.database_url.as_deref().ok_or_else(|| {
                    DomainError::validation("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")
                })?;
                let db = crate::postgres::PgDatabase::connect(url, 10).await?;
                return Ok(Arc::new(db));
            }
            #[cfg(not(feature = "postgres"))]
            {
                tracing::warn!(
                    "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
                );
            }
        }

        let db = match &self.data_file {
            Some(path) => MemoryDatabase::open(path.clone()).await?,
            None => MemoryDatabase::new(),
        };
        Ok(Arc::new(db))
    }

    pub async fn back_office(&self) -> StoreResult<BackOffice> {
        Ok(BackOffice::new(self.open_database().await?, self.oversell))
    }
}
