use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument};
use crate::error::{Error, Result};
use crate::interfaces::{RateStore, UpdateObserver};
use crate::observability::tracing::{trace_crawl, trace_update_cycle};
use crate::price_infra::connectors::Crawler;
use crate::types::{Pair, RateSample};

type CrawlResult = Result<HashMap<Pair, f64>>;

/// Polls every crawler on a fixed interval and writes what they return to the store.
pub struct Updater {
    store: Arc<dyn RateStore>,
    pairs: Arc<[Pair]>,
    crawlers: Vec<Arc<dyn Crawler>>,
    interval: Duration,
    observer: Arc<dyn UpdateObserver>,
    cycles: AtomicU64,
}

/// What one completed cycle did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CycleReport {
    pub stored: usize,
    pub write_failures: usize,
    pub failed_exchanges: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Cancellation was observed once polling finished; nothing was stored.
    Cancelled,
}

impl Updater {
    /// Exchange names key the stored rows, so two crawlers may not share one.
    pub fn new(
        store: Arc<dyn RateStore>,
        pairs: Vec<Pair>,
        crawlers: Vec<Arc<dyn Crawler>>,
        interval: Duration,
        observer: Arc<dyn UpdateObserver>,
    ) -> Result<Self> {
        let mut names = HashSet::new();
        for crawler in &crawlers {
            if !names.insert(crawler.exchange().to_string()) {
                return Err(Error::DuplicateExchange(crawler.exchange().to_string()));
            }
        }

        Ok(Updater {
            store,
            pairs: pairs.into(),
            crawlers,
            interval,
            observer,
            cycles: AtomicU64::new(0),
        })
    }

    /// Runs cycles until `cancel` fires, sleeping `interval` between them.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if let CycleOutcome::Cancelled = self.poll_once(&cancel).await {
                debug!("stopping update loop");
                return;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("stopping update loop");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// One cycle: crawl every exchange concurrently, wait for all of them, then store.
    pub async fn poll_once(&self, cancel: &CancellationToken) -> CycleOutcome {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;

        async {
            info!("update started");
            let results = self.crawl_all(cancel).await;

            if cancel.is_cancelled() {
                debug!("update cancelled, skipping store");
                return CycleOutcome::Cancelled;
            }

            let observed_at = Utc::now();
            let mut report = CycleReport::default();
            for (exchange, result) in results {
                match result {
                    Ok(rates) => self.store(&exchange, rates, observed_at, &mut report).await,
                    Err(e) if e.is_cancelled() => {
                        debug!(exchange = %exchange, "crawling cancelled");
                    }
                    Err(e) => {
                        error!(exchange = %exchange, error = %e, "crawling failed");
                        report.failed_exchanges.push(exchange);
                    }
                }
            }

            info!(
                stored = report.stored,
                write_failures = report.write_failures,
                failed_exchanges = report.failed_exchanges.len(),
                "update finished"
            );
            CycleOutcome::Completed(report)
        }
        .instrument(trace_update_cycle(cycle))
        .await
    }

    async fn crawl_all(&self, cancel: &CancellationToken) -> Vec<(String, CrawlResult)> {
        let handles: Vec<_> = self
            .crawlers
            .iter()
            .map(|crawler| {
                let exchange = crawler.exchange().to_string();
                let span = trace_crawl(&exchange);
                let crawler = Arc::clone(crawler);
                let pairs = Arc::clone(&self.pairs);
                let observer = Arc::clone(&self.observer);
                let cancel = cancel.clone();

                let handle = tokio::spawn(
                    async move {
                        info!("crawling started");
                        let started = Instant::now();
                        let result = crawler.crawl(&pairs, &cancel).await;
                        let elapsed = started.elapsed();

                        observer.crawl_finished(crawler.exchange(), elapsed, result.is_ok());
                        if let Ok(rates) = &result {
                            info!(
                                rates = rates.len(),
                                elapsed_ms = elapsed.as_millis() as u64,
                                "crawling finished"
                            );
                        }
                        result
                    }
                    .instrument(span),
                );
                (exchange, handle)
            })
            .collect();

        join_all(handles.into_iter().map(|(exchange, handle)| async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::TaskFailure(e.to_string())),
            };
            (exchange, result)
        }))
        .await
    }

    async fn store(
        &self,
        exchange: &str,
        rates: HashMap<Pair, f64>,
        observed_at: DateTime<Utc>,
        report: &mut CycleReport,
    ) {
        for (pair, rate) in rates {
            let sample = RateSample::new(pair, exchange, rate, observed_at);

            match self.store.upsert(&sample).await {
                Ok(()) => {
                    report.stored += 1;
                    self.observer.rate_stored(exchange, true);
                    debug!(pair = %sample.pair, exchange, rate, "saved successfully");
                }
                Err(e) => {
                    report.write_failures += 1;
                    self.observer.rate_stored(exchange, false);
                    error!(pair = %sample.pair, exchange, rate, error = %e, "error saving");
                }
            }
        }
    }
}
