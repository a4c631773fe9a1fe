pub mod memory;
pub mod postgres;

pub use memory::MemoryRateStore;
pub use postgres::{PgRateStore, PostgresConfig};

use std::sync::Arc;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::error::Result;
use crate::interfaces::RateStore;
use crate::observability::metrics::{status_label, DB_DURATION, DB_REQUESTS};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; rows are lost on restart.
    #[default]
    Memory,
    Postgres,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub postgres: PostgresConfig,
}

/// Opens the configured backend. Postgres is connected and its table created here.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn RateStore>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("using in-memory rate storage");
            Ok(Arc::new(MemoryRateStore::new()))
        }
        StorageBackend::Postgres => {
            let store = PgRateStore::connect(&config.postgres).await?;
            info!(
                host = %config.postgres.host,
                database = %config.postgres.database,
                "connected to postgres rate storage"
            );
            Ok(Arc::new(store))
        }
    }
}

/// `request` is `save` or `findAll`.
pub(crate) fn observe_request(request: &str, started: Instant, succeeded: bool) {
    DB_DURATION.observe(started.elapsed().as_secs_f64());
    DB_REQUESTS
        .with_label_values(&[request, status_label(succeeded)])
        .inc();
}
