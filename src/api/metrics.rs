use axum::{Router, routing::get, http::StatusCode};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use crate::api::with_limits;
use crate::config::HttpLimits;
use crate::error::Result;
use crate::observability::metrics::gather_text;

pub fn create_router(limits: &HttpLimits) -> Router {
    with_limits(Router::new().route("/metrics", get(metrics)), limits)
}

/// Serves the Prometheus endpoint on `listener` until `cancel` fires.
pub async fn serve(listener: TcpListener, limits: HttpLimits, cancel: CancellationToken) -> Result<()> {
    tracing::info!(addr = ?listener.local_addr().ok(), "metrics server listening");
    axum::serve(listener, create_router(&limits))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    tracing::info!("metrics server stopped");
    Ok(())
}

async fn metrics() -> std::result::Result<String, StatusCode> {
    gather_text().map_err(|e| {
        tracing::error!(error = %e, "metrics encoding failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use crate::observability::metrics::register_metrics;

    #[tokio::test]
    async fn test_metrics_endpoint() {
        register_metrics();

        let response = create_router(&HttpLimits::default())
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("db_requests_duration_seconds"));
    }
}
