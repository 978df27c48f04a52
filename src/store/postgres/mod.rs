//! PostgreSQL forum store for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)
//!
//! ## Transactions
//!
//! Every multi-statement mutation runs inside one `sqlx::Transaction`.
//! Returning early with `?` drops the transaction, which rolls it back;
//! `commit` is only reached on the success path.

mod comments;
mod posts;
mod rows;
mod schema;
mod topics;
mod users;
mod votes;

pub use schema::FORUM_SCHEMA;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Executor, Row};
use std::time::Duration;

use super::{ForumStore, PoolStats};
use crate::error::ForumResult;
use crate::query::{Paged, RenderedListing, SqlParam, SqlStatement};

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/forum".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// PostgreSQL forum store.
///
/// Comment paths are stored as `ltree` and subtree reads use `<@` against a
/// GiST index. Concurrent votes on one item serialize on the item's row lock.
#[derive(Debug, Clone)]
pub struct PostgresForumStore {
    pool: PgPool,
}

impl PostgresForumStore {
    /// Create a new store with the given configuration.
    pub async fn new(config: PostgresConfig) -> Result<Self, sqlx::Error> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, sqlx::Error> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create missing tables, indexes and the `ltree` extension.
    pub async fn apply_schema(&self) -> Result<(), sqlx::Error> {
        self.pool.execute(FORUM_SCHEMA).await?;
        tracing::info!("Forum schema applied");
        Ok(())
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    /// Run a rendered listing: page fetch plus matching count.
    async fn fetch_page<T>(
        &self,
        listing: &RenderedListing,
        parse: fn(&PgRow) -> ForumResult<T>,
    ) -> ForumResult<Paged<T>> {
        let rows = bind_all(sqlx::query(&listing.fetch.sql), &listing.fetch.params)
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = bind_all(sqlx::query(&listing.count.sql), &listing.count.params)
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;

        let items = rows.iter().map(parse).collect::<ForumResult<Vec<_>>>()?;
        Ok(Paged::new(items, total))
    }

    /// Run a rendered single-row read.
    async fn fetch_detail<T>(
        &self,
        stmt: &SqlStatement,
        parse: fn(&PgRow) -> ForumResult<T>,
    ) -> ForumResult<Option<T>> {
        bind_all(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(parse)
            .transpose()
    }
}

/// Bind rendered parameters in placeholder order.
fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::Text(value) => query.bind(value.as_str()),
        };
    }
    query
}

#[async_trait]
impl ForumStore for PostgresForumStore {
    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(PostgresForumStore::pool_stats(self))
    }
}
