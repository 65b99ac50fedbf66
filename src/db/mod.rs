//! Database module providing connection management, migrations, and queries.
//!
//! Query functions are generic over [`ConnectionTrait`] so the engine can run
//! them against the pool or inside an open transaction.

pub mod defects;
pub mod execution_steps;
pub mod executions;
pub mod legacy;
pub mod test_cases;
pub mod test_cycles;
pub mod test_steps;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::config::DatabaseSettings;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

pub use sea_orm::ConnectionTrait;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect using the given settings.
    pub async fn new(settings: &DatabaseSettings) -> AppResult<Self> {
        let mut options = ConnectOptions::new(settings.url.clone());
        options
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(
            max_connections = settings.max_connections,
            "Database connection pool established"
        );

        Ok(Self { conn })
    }

    /// Wrap an already established connection.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get the underlying connection for executing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Open a transaction. Close it with [`finish`].
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.conn
            .begin()
            .await
            .map_err(AppError::db("Failed to begin transaction"))
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;

        info!("Database migrations complete");
        Ok(())
    }
}

/// Commit `txn` when `outcome` is `Ok`, roll it back otherwise.
///
/// The original error is returned unchanged after a rollback.
pub async fn finish<T>(txn: DatabaseTransaction, outcome: AppResult<T>) -> AppResult<T> {
    match outcome {
        Ok(value) => {
            txn.commit()
                .await
                .map_err(AppError::db("Failed to commit transaction"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            warn!(error = %err, "Transaction rolled back");
            Err(err)
        }
    }
}
