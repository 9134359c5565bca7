//! PostgreSQL implementation of the auction cache store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use tracing::{info, instrument};

use crate::domain::{AuctionRecord, AuctionStatus, AuctionStore, NftRecord, StoreError};

/// PostgreSQL connection pool configuration.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// Cache store backed by a PostgreSQL connection pool. The tables are
/// written by an external event listener; this store only reads them.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with custom pool configuration.
    pub async fn connect(database_url: &str, config: PostgresConfig) -> Result<Self, StoreError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Creates a new store with default pool configuration.
    pub async fn with_defaults(database_url: &str) -> Result<Self, StoreError> {
        Self::connect(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection pool (for testing).
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_nft(row: &sqlx::postgres::PgRow) -> Result<NftRecord, StoreError> {
        Ok(NftRecord {
            id: row.try_get("id")?,
            token_id: row.try_get("token_id")?,
            owner: row.try_get("owner")?,
            minted_at: row.try_get("minted_at")?,
        })
    }

    fn row_to_auction(row: &sqlx::postgres::PgRow) -> Result<AuctionRecord, StoreError> {
        let status: String = row.try_get("status")?;

        Ok(AuctionRecord {
            id: row.try_get("id")?,
            address: row.try_get("address")?,
            token_id: row.try_get("token_id")?,
            creator: row.try_get("creator")?,
            status: status.parse().unwrap_or(AuctionStatus::Created),
            highest_bid: row.try_get("highest_bid")?,
            highest_bidder: row.try_get("highest_bidder")?,
            min_bid_increment: row.try_get("min_bid_increment")?,
            duration: row.try_get("duration")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            cancelled_at: row.try_get("cancelled_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl AuctionStore for PostgresStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_nfts(&self) -> Result<Vec<NftRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, token_id, "owner", minted_at
            FROM erc721
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_nft).collect()
    }

    #[instrument(skip(self))]
    async fn list_auctions(&self) -> Result<Vec<AuctionRecord>, StoreError> {
        // Numeric columns come back as text to preserve precision.
        let rows = sqlx::query(
            r#"
            SELECT id, address, token_id, creator, status::text AS status,
                   highest_bid::text AS highest_bid, highest_bidder,
                   min_bid_increment::text AS min_bid_increment, duration,
                   started_at, ended_at, cancelled_at, created_at
            FROM auctions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_auction).collect()
    }
}
