use std::collections::HashMap;
use async_trait::async_trait;
use reqwest::{Client, Request};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use crate::error::{Error, Result};
use crate::price_infra::connectors::http::RawQuote;
use crate::price_infra::connectors::{fetch_cancellable, rate_field, trim_base_url, Crawler, PairSkip};
use crate::types::Pair;

pub const EXMO_API_URL: &str = "https://api.exmo.com";

/// Exmo ticker dump: one request for every listed pair, filtered locally.
///
/// Unlike the per-pair connectors there is no cancellation check between pairs;
/// only the single request observes cancellation.
pub struct ExmoConnector {
    client: Client,
    base_url: String,
}

impl ExmoConnector {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, EXMO_API_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        ExmoConnector {
            client,
            base_url: trim_base_url(base_url),
        }
    }

    fn ticker_request(&self) -> Result<Request> {
        self.client
            .get(format!("{}/v1/ticker/", self.base_url))
            .build()
            .map_err(|e| Error::RequestBuild(e.to_string()))
    }
}

/// The whole dump is an error payload: `{"result":false,"error":"..."}`.
fn is_api_error(data: &RawQuote) -> bool {
    matches!(data.get("result"), Some(Value::Bool(false)))
}

/// `{"BTC_USD":{"buy_price":"7786.06","sell_price":"7798.72988289",...},...}`
fn sell_price(data: &RawQuote, pair: &Pair) -> std::result::Result<f64, PairSkip> {
    let ticker = data
        .get(&pair.underscored())
        .ok_or(PairSkip::NotListed)?
        .as_object()
        .ok_or(PairSkip::UnexpectedFormat)?;

    rate_field(ticker, "sell_price")
}

#[async_trait]
impl Crawler for ExmoConnector {
    async fn crawl(&self, pairs: &[Pair], cancel: &CancellationToken) -> Result<HashMap<Pair, f64>> {
        let request = self.ticker_request()?;
        let data = fetch_cancellable(&self.client, request, cancel).await?;

        if is_api_error(&data) {
            return Err(Error::ApiError(Value::Object(data).to_string()));
        }

        let mut rates = HashMap::with_capacity(pairs.len());
        for pair in pairs {
            match sell_price(&data, pair) {
                Ok(rate) => {
                    rates.insert(pair.clone(), rate);
                }
                Err(reason) => {
                    warn!(exchange = self.exchange(), pair = %pair, %reason, "pair skipped");
                }
            }
        }

        Ok(rates)
    }

    fn exchange(&self) -> &str {
        "Exmo"
    }
}
