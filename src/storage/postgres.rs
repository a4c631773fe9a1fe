use std::fmt;
use std::time::{Duration, Instant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::trace;
use crate::error::{Error, Result};
use crate::interfaces::RateStore;
use crate::storage::observe_request;
use crate::types::{Pair, RateSample};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS rate (
        pair     TEXT             NOT NULL,
        exchange TEXT             NOT NULL,
        rate     DOUBLE PRECISION NOT NULL,
        updated  TIMESTAMPTZ      NOT NULL,
        PRIMARY KEY (pair, exchange)
    )";

const UPSERT: &str = "
    INSERT INTO rate (pair, exchange, rate, updated)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (pair, exchange) DO UPDATE
    SET rate = EXCLUDED.rate, updated = EXCLUDED.updated";

const SELECT_ALL: &str = "SELECT pair, exchange, rate, updated FROM rate";

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    /// Bound on waiting for a pooled connection, and so on every request.
    pub acquire_timeout_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        PostgresConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "exmonit".to_string(),
            max_connections: 5,
            acquire_timeout_ms: 5_000,
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl PostgresConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_millis(self.acquire_timeout_ms))
    }
}

/// `rate` table keyed by (pair, exchange); the pair is stored as `FROM/TO`.
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    /// Connects eagerly and creates the table when missing.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await
            .map_err(|e| Error::StorageError(format!("can't connect to postgres: {}", e)))?;

        let store = PgRateStore::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Connections are opened on first use.
    pub fn connect_lazy(config: &PostgresConfig) -> Self {
        PgRateStore::from_pool(config.pool_options().connect_lazy_with(config.connect_options()))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PgRateStore { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::StorageError(format!("can't create rate table: {}", e)))?;
        Ok(())
    }
}

fn sample_from_row(row: &PgRow) -> std::result::Result<RateSample, String> {
    let pair: String = row.try_get("pair").map_err(|e| e.to_string())?;
    let exchange: String = row.try_get("exchange").map_err(|e| e.to_string())?;
    let rate: f64 = row.try_get("rate").map_err(|e| e.to_string())?;
    let updated: DateTime<Utc> = row.try_get("updated").map_err(|e| e.to_string())?;

    let pair = pair.parse::<Pair>().map_err(|e| e.to_string())?;
    Ok(RateSample::new(pair, exchange, rate, updated))
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn upsert(&self, sample: &RateSample) -> Result<()> {
        let started = Instant::now();

        let result = sqlx::query(UPSERT)
            .bind(sample.pair.to_string())
            .bind(&sample.exchange)
            .bind(sample.rate)
            .bind(sample.observed_at)
            .execute(&self.pool)
            .await;

        observe_request("save", started, result.is_ok());
        result.map_err(|e| Error::StorageError(format!("error on inserting or updating: {}", e)))?;

        trace!(pair = %sample.pair, exchange = %sample.exchange, "row upserted");
        Ok(())
    }

    /// Rows ordered by pair, then exchange.
    async fn list_all(&self) -> Result<Vec<RateSample>> {
        let started = Instant::now();

        let rows = match sqlx::query(SELECT_ALL).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                observe_request("findAll", started, false);
                return Err(Error::StorageError(format!("error on selecting rates: {}", e)));
            }
        };

        let decoded: std::result::Result<Vec<RateSample>, String> =
            rows.iter().map(sample_from_row).collect();
        observe_request("findAll", started, decoded.is_ok());

        let mut samples =
            decoded.map_err(|e| Error::StorageError(format!("malformed rate row: {}", e)))?;
        samples.sort_by(|a, b| (&a.pair, &a.exchange).cmp(&(&b.pair, &b.exchange)));
        Ok(samples)
    }
}
