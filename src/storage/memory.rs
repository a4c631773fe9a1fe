use std::time::Instant;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;
use crate::error::Result;
use crate::interfaces::RateStore;
use crate::storage::observe_request;
use crate::types::{Pair, RateSample};

/// Latest rate per (pair, exchange), kept in process memory.
pub struct MemoryRateStore {
    rates: DashMap<(Pair, String), RateSample>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        MemoryRateStore {
            rates: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for MemoryRateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn upsert(&self, sample: &RateSample) -> Result<()> {
        let started = Instant::now();

        // The key carries the whole identity, so replacing the row overwrites rate and timestamp.
        self.rates.insert(sample.key(), sample.clone());

        trace!(pair = %sample.pair, exchange = %sample.exchange, "row upserted");
        observe_request("save", started, true);
        Ok(())
    }

    /// Rows ordered by pair, then exchange.
    async fn list_all(&self) -> Result<Vec<RateSample>> {
        let started = Instant::now();

        let mut rows: Vec<RateSample> = self.rates.iter().map(|row| row.value().clone()).collect();
        rows.sort_by(|a, b| (&a.pair, &a.exchange).cmp(&(&b.pair, &b.exchange)));

        observe_request("findAll", started, true);
        Ok(rows)
    }
}
