use std::sync::Once;
use std::time::Duration;
use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use crate::error::{Error, Result};
use crate::interfaces::UpdateObserver;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Crawl metrics
    pub static ref UPDATE_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "update_duration_seconds",
            "Time spent crawling one exchange"
        ).buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["exchange"]
    ).unwrap();

    pub static ref CRAWL_RESULTS: IntCounterVec = IntCounterVec::new(
        Opts::new("crawl_results_total", "Crawl calls by outcome"),
        &["exchange", "status"]
    ).unwrap();

    pub static ref RATES_STORED: IntCounterVec = IntCounterVec::new(
        Opts::new("rates_stored_total", "Rate writes by outcome"),
        &["exchange", "status"]
    ).unwrap();

    // Storage metrics
    pub static ref DB_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("db_requests_total", "Storage requests by type and outcome"),
        &["type", "status"]
    ).unwrap();

    pub static ref DB_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "db_requests_duration_seconds",
            "Storage request latency"
        ).buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0])
    ).unwrap();
}

static REGISTER: Once = Once::new();

/// Registers every metric with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(UPDATE_DURATION.clone()),
            Box::new(CRAWL_RESULTS.clone()),
            Box::new(RATES_STORED.clone()),
            Box::new(DB_REQUESTS.clone()),
            Box::new(DB_DURATION.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                tracing::warn!(error = %e, "metric registration failed");
            }
        }
    });
}

/// Prometheus text exposition of [`REGISTRY`].
pub fn gather_text() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| Error::TaskFailure(format!("metrics encoding failed: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| Error::TaskFailure(format!("metrics encoding failed: {}", e)))
}

pub(crate) fn status_label(succeeded: bool) -> &'static str {
    if succeeded { "success" } else { "fail" }
}

/// Feeds updater events into the process-wide registry.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrometheusObserver;

impl PrometheusObserver {
    pub fn new() -> Self {
        register_metrics();
        PrometheusObserver
    }
}

impl UpdateObserver for PrometheusObserver {
    fn crawl_finished(&self, exchange: &str, elapsed: Duration, succeeded: bool) {
        UPDATE_DURATION
            .with_label_values(&[exchange])
            .observe(elapsed.as_secs_f64());
        CRAWL_RESULTS
            .with_label_values(&[exchange, status_label(succeeded)])
            .inc();
    }

    fn rate_stored(&self, exchange: &str, succeeded: bool) {
        RATES_STORED
            .with_label_values(&[exchange, status_label(succeeded)])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_updates_registry() {
        let observer = PrometheusObserver::new();
        let before = CRAWL_RESULTS.with_label_values(&["metrics-test", "fail"]).get();

        observer.crawl_finished("metrics-test", Duration::from_millis(120), false);
        observer.rate_stored("metrics-test", true);

        assert_eq!(CRAWL_RESULTS.with_label_values(&["metrics-test", "fail"]).get(), before + 1);
        assert!(RATES_STORED.with_label_values(&["metrics-test", "success"]).get() >= 1);

        let text = gather_text().unwrap();
        assert!(text.contains("update_duration_seconds"));
        assert!(text.contains("exchange=\"metrics-test\""));
    }

    #[test]
    fn test_register_twice() {
        register_metrics();
        register_metrics();

        let families = REGISTRY.gather();
        let storage_latency = families
            .iter()
            .filter(|family| family.get_name() == "db_requests_duration_seconds")
            .count();
        assert_eq!(storage_latency, 1);
    }
}
