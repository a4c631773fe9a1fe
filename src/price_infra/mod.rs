pub mod connectors;
pub mod updater;

use std::sync::Arc;
use std::time::Duration;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::price_infra::connectors::binance::{BinanceConnector, BINANCE_API_URL};
use crate::price_infra::connectors::exmo::{ExmoConnector, EXMO_API_URL};
use crate::price_infra::connectors::Crawler;

/// Upper bound for every single exchange request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub binance_url: String,
    pub exmo_url: String,
    pub request_timeout_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            binance_url: BINANCE_API_URL.to_string(),
            exmo_url: EXMO_API_URL.to_string(),
            request_timeout_ms: REQUEST_TIMEOUT.as_millis() as u64,
        }
    }
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Client shared read-only by every connector.
pub fn build_http_client(config: &SourcesConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Every supported exchange, built once at startup.
pub fn default_crawlers(client: Client, config: &SourcesConfig) -> Vec<Arc<dyn Crawler>> {
    vec![
        Arc::new(BinanceConnector::with_base_url(client.clone(), &config.binance_url)),
        Arc::new(ExmoConnector::with_base_url(client, &config.exmo_url)),
    ]
}
