use std::time::Duration;

/// Side channel the updater reports into after every crawl and every write.
pub trait UpdateObserver: Send + Sync {
    fn crawl_finished(&self, exchange: &str, elapsed: Duration, succeeded: bool);

    fn rate_stored(&self, exchange: &str, succeeded: bool);
}

/// Observer that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl UpdateObserver for NoopObserver {
    fn crawl_finished(&self, _exchange: &str, _elapsed: Duration, _succeeded: bool) {}

    fn rate_stored(&self, _exchange: &str, _succeeded: bool) {}
}
