//! Postgres-backed store.
//!
//! Each [`Transaction`] wraps one `sqlx` transaction. Dropping it without a
//! commit rolls back on the server. Cached counters are updated with
//! single-statement arithmetic (`stock = GREATEST(stock + $1, 0)`) so
//! concurrent sales never lose an update.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Domain(Conflict)` |
//! | Database (foreign key violation) | `23503` | `Domain(Conflict)` |
//! | Database (check constraint violation) | `23514` | `Domain(InvariantViolation)` |
//! | Database (numeric value out of range) | `22003` | `Domain(InvariantViolation)` |
//! | Anything else | N/A | `Sqlx` |

mod repos;
mod rows;

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use tracing::{info, instrument};

use shopbooks_core::DomainError;

use crate::error::{StoreError, StoreResult};
use crate::repository::{Database, Transaction};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply the schema.
    #[instrument(skip(url), err)]
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let db = Self::new(pool);
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the (idempotent) schema.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        info!("database schema applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PgTransaction { tx }))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn data_file(&self) -> Option<PathBuf> {
        None
    }
}

pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        this.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

/// Map SQLx errors to store errors. Constraint violations become domain
/// errors so the API can answer 409/422 instead of 500.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") => StoreError::Domain(DomainError::conflict(msg)),
                Some("23514") | Some("22003") => StoreError::Domain(DomainError::invariant(msg)),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Sqlx(other),
    }
}
