use async_trait::async_trait;
use crate::error::Result;
use crate::types::RateSample;

/// Persistence boundary for the latest rate per (pair, exchange).
///
/// Implementations must accept concurrent `upsert` calls for distinct keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Inserts a row for `(sample.pair, sample.exchange)` or overwrites its rate and
    /// timestamp. Last write wins.
    async fn upsert(&self, sample: &RateSample) -> Result<()>;

    async fn list_all(&self) -> Result<Vec<RateSample>>;
}
