//! # Persistence Gateway
//!
//! Owns the SQLite connection pool and runs parameterized statements on it.
//! Every failure leaves this module as a classified [`StoreError`]; adapters
//! convert those into `DomainError` at the port boundary.

use std::str::FromStr;

use configs::DatabaseSettings;
use domains::DomainError;
use secrecy::ExposeSecret;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteQueryResult, SqliteRow,
};
use sqlx::{Execute, Sqlite, Transaction};
use thiserror::Error;
use tracing::{error, info, trace};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// A single SQLite statement with its bound parameters.
pub type Statement<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Classified persistence failure.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No connection became free within the acquire timeout.
    #[error("connection pool exhausted")]
    PoolExhausted,

    #[error("connection pool closed")]
    PoolClosed,

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// A stored value could not be mapped back to a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("migration failed: {0}")]
    Migrate(#[from] MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::PoolClosed => StoreError::PoolClosed,
            sqlx::Error::Database(db) => {
                if db.is_unique_violation() {
                    StoreError::UniqueViolation(db.message().to_string())
                } else if db.is_foreign_key_violation() {
                    StoreError::ForeignKeyViolation(db.message().to_string())
                } else {
                    StoreError::Sqlx(sqlx::Error::Database(db))
                }
            }
            other => StoreError::Sqlx(other),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PoolExhausted | StoreError::PoolClosed => {
                DomainError::ResourceExhausted(err.to_string())
            }
            other => {
                error!(error = %other, "storage failure");
                DomainError::Storage(other.to_string())
            }
        }
    }
}

/// Explicitly constructed handle over the connection pool. Cloning is cheap
/// and every clone shares the same pool.
#[derive(Clone, Debug)]
pub struct Gateway {
    pool: SqlitePool,
}

impl Gateway {
    /// Opens (creating if missing) the database described by `settings`.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(settings.url.expose_secret())?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(settings.busy_timeout());

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout())
            .connect_with(options)
            .await?;

        info!(
            max_connections = settings.max_connections,
            acquire_timeout_ms = settings.acquire_timeout_ms,
            busy_timeout_ms = settings.busy_timeout_ms,
            "database pool ready"
        );
        Ok(Self { pool })
    }

    /// Wraps an already configured pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR.run(&self.pool).await?;
        info!("schema migrations applied");
        Ok(())
    }

    /// Round-trips a trivial statement to prove the store is reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.fetch_optional(sqlx::query("SELECT 1")).await?;
        Ok(())
    }

    pub async fn fetch_all<'q>(&self, statement: Statement<'q>) -> Result<Vec<SqliteRow>, StoreError> {
        trace!(sql = statement.sql(), "fetch_all");
        Ok(statement.fetch_all(&self.pool).await?)
    }

    pub async fn fetch_optional<'q>(
        &self,
        statement: Statement<'q>,
    ) -> Result<Option<SqliteRow>, StoreError> {
        trace!(sql = statement.sql(), "fetch_optional");
        Ok(statement.fetch_optional(&self.pool).await?)
    }

    pub async fn execute<'q>(&self, statement: Statement<'q>) -> Result<SqliteQueryResult, StoreError> {
        trace!(sql = statement.sql(), "execute");
        Ok(statement.execute(&self.pool).await?)
    }

    /// Checks a connection out of the pool. It returns to the pool on drop.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, StoreError> {
        Ok(self.pool.acquire().await?)
    }

    /// Starts a transaction for multi-statement sequences. Dropping it
    /// without `commit` rolls everything back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin().await?)
    }

    /// Stops handing out connections and waits for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
