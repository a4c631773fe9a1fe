use std::sync::Arc;
use axum::{
    Router,
    routing::get,
    extract::{State, Json},
    http::StatusCode,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use crate::api::with_limits;
use crate::config::HttpLimits;
use crate::error::Result;
use crate::interfaces::RateStore;
use crate::types::RateSample;

pub struct ApiState {
    pub store: Arc<dyn RateStore>,
}

pub fn create_router(state: Arc<ApiState>, limits: &HttpLimits) -> Router {
    let routes = Router::new()
        .route("/status", get(heartbeat))
        .route("/get_rates", get(get_rates));

    with_limits(routes, limits)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the read API on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ApiState>,
    limits: HttpLimits,
    cancel: CancellationToken,
) -> Result<()> {
    tracing::info!(addr = ?listener.local_addr().ok(), "http server listening");
    axum::serve(listener, create_router(state, &limits))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    tracing::info!("http server stopped");
    Ok(())
}

async fn heartbeat() -> &'static str {
    "."
}

#[derive(Debug, Serialize, serde::Deserialize, PartialEq)]
pub struct RateView {
    pub pair: String,
    pub exchange: String,
    pub rate: f64,
    pub updated: String,
}

impl From<&RateSample> for RateView {
    fn from(sample: &RateSample) -> Self {
        RateView {
            pair: sample.pair.to_string(),
            exchange: sample.exchange.clone(),
            rate: sample.rate,
            updated: sample.formatted_updated(),
        }
    }
}

async fn get_rates(
    State(state): State<Arc<ApiState>>,
) -> std::result::Result<Json<Vec<RateView>>, StatusCode> {
    let saved = state.store.list_all().await.map_err(|e| {
        tracing::error!(error = %e, "listing rates failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(saved.iter().map(RateView::from).collect()))
}
