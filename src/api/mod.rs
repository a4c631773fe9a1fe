pub mod metrics;
pub mod rest;

use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use crate::config::HttpLimits;

/// Caps in-flight requests across every route and answers 408 once a request,
/// queueing included, outlives the timeout.
pub fn with_limits<S>(router: Router<S>, limits: &HttpLimits) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(GlobalConcurrencyLimitLayer::new(limits.max_concurrent_requests))
        .layer(TimeoutLayer::new(limits.request_timeout()))
}
