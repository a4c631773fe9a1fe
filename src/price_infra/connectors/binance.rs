use std::collections::HashMap;
use async_trait::async_trait;
use reqwest::{Client, Request};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use crate::error::{Error, Result};
use crate::price_infra::connectors::http::RawQuote;
use crate::price_infra::connectors::{fetch_cancellable, rate_field, trim_base_url, Crawler, PairSkip};
use crate::types::Pair;

pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// Binance average price endpoint, one request per pair.
pub struct BinanceConnector {
    client: Client,
    base_url: String,
}

impl BinanceConnector {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, BINANCE_API_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        BinanceConnector {
            client,
            base_url: trim_base_url(base_url),
        }
    }

    fn avg_price_request(&self, pair: &Pair) -> Result<Request> {
        self.client
            .get(format!("{}/api/v3/avgPrice", self.base_url))
            .query(&[("symbol", pair.concatenated())])
            .build()
            .map_err(|e| Error::RequestBuild(e.to_string()))
    }
}

/// `{"mins":5,"price":"1.1"}`, or `{"code":-1121,"msg":"Invalid symbol."}` on api errors.
fn parse_avg_price(data: &RawQuote) -> std::result::Result<f64, PairSkip> {
    if data.contains_key("code") {
        return Err(PairSkip::ApiError(serde_json::Value::Object(data.clone()).to_string()));
    }
    rate_field(data, "price")
}

#[async_trait]
impl Crawler for BinanceConnector {
    async fn crawl(&self, pairs: &[Pair], cancel: &CancellationToken) -> Result<HashMap<Pair, f64>> {
        let mut rates = HashMap::with_capacity(pairs.len());

        for pair in pairs {
            if cancel.is_cancelled() {
                debug!(exchange = self.exchange(), pair = %pair, "crawling stopped by cancellation");
                return Err(Error::Cancelled);
            }

            let request = self.avg_price_request(pair)?;
            let data = fetch_cancellable(&self.client, request, cancel).await?;

            match parse_avg_price(&data) {
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
        "Binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request as MockRequest, Respond, ResponseTemplate};

    /// Cancels `token` when the request arrives, then answers slowly.
    struct CancelOnRequest {
        token: CancellationToken,
    }

    impl Respond for CancelOnRequest {
        fn respond(&self, _request: &MockRequest) -> ResponseTemplate {
            self.token.cancel();
            ResponseTemplate::new(200)
                .set_body_string(r#"{"mins":5,"price":"2.2"}"#)
                .set_delay(Duration::from_secs(2))
        }
    }

    fn btc_usdt() -> Pair {
        Pair::new("BTC", "USDT")
    }

    fn btc_rub() -> Pair {
        Pair::new("BTC", "RUB")
    }

    async fn mount_price(server: &MockServer, symbol: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path("/api/v3/avgPrice"))
            .and(query_param("symbol", symbol))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_crawl() {
        let server = MockServer::start().await;
        mount_price(&server, "BTCUSDT", r#"{"mins":5,"price":"1.1"}"#).await;
        mount_price(&server, "BTCRUB", r#"{"mins":5,"price":"2.2"}"#).await;

        let connector = BinanceConnector::with_base_url(Client::new(), server.uri());
        let result = connector
            .crawl(&[btc_usdt(), btc_rub()], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[&btc_usdt()], 1.1);
        assert_eq!(result[&btc_rub()], 2.2);
    }

    #[tokio::test]
    async fn test_crawl_api_error() {
        let server = MockServer::start().await;
        mount_price(&server, "BTCUSDT", r#"{"code":-1121,"msg":"Invalid symbol."}"#).await;

        let connector = BinanceConnector::with_base_url(Client::new(), server.uri());
        let result = connector
            .crawl(&[btc_usdt()], &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_skips_unparsable_price() {
        let server = MockServer::start().await;
        mount_price(&server, "BTCUSDT", r#"{"mins":5,"price":"not-a-number"}"#).await;
        mount_price(&server, "BTCRUB", r#"{"mins":5,"price":"2.2"}"#).await;

        let connector = BinanceConnector::with_base_url(Client::new(), server.uri());
        let result = connector
            .crawl(&[btc_usdt(), btc_rub()], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert!(!result.contains_key(&btc_usdt()));
        assert_eq!(result[&btc_rub()], 2.2);
    }

    #[tokio::test]
    async fn test_crawl_skips_missing_and_mistyped_price() {
        let server = MockServer::start().await;
        mount_price(&server, "BTCUSDT", r#"{"mins":5}"#).await;
        mount_price(&server, "BTCRUB", r#"{"mins":5,"price":2.2}"#).await;

        let connector = BinanceConnector::with_base_url(Client::new(), server.uri());
        let result = connector
            .crawl(&[btc_usdt(), btc_rub()], &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_fails_on_bad_status() {
        let server = MockServer::start().await;
        mount_price(&server, "BTCRUB", r#"{"mins":5,"price":"2.2"}"#).await;
        Mock::given(method("GET"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let connector = BinanceConnector::with_base_url(Client::new(), server.uri());
        let result = connector
            .crawl(&[btc_rub(), btc_usdt()], &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(Error::UnexpectedStatus(503))));
    }

    #[tokio::test]
    async fn test_crawl_cancelled_before_first_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"mins":5,"price":"1.1"}"#))
            .expect(0)
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let connector = BinanceConnector::with_base_url(Client::new(), server.uri());
        let result = connector.crawl(&[btc_usdt(), btc_rub()], &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_crawl_cancelled_after_first_pair_discards_results() {
        let server = MockServer::start().await;
        let cancel = CancellationToken::new();
        Mock::given(query_param("symbol", "BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"mins":5,"price":"1.1"}"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(query_param("symbol", "BTCRUB"))
            .respond_with(CancelOnRequest { token: cancel.clone() })
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(query_param("symbol", "BTCEUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"mins":5,"price":"3.3"}"#))
            .expect(0)
            .mount(&server)
            .await;

        let connector = BinanceConnector::with_base_url(Client::new(), server.uri());
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            connector.crawl(&[btc_usdt(), btc_rub(), Pair::new("BTC", "EUR")], &cancel),
        )
        .await
        .expect("in-flight request did not observe cancellation");

        // BTCUSDT had already resolved; it must not leak out.
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_request_shape() {
        let connector = BinanceConnector::new(Client::new());
        let request = connector.avg_price_request(&btc_usdt()).unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.binance.com/api/v3/avgPrice?symbol=BTCUSDT"
        );
    }

    #[test]
    fn test_exchange() {
        assert_eq!(BinanceConnector::new(Client::new()).exchange(), "Binance");
    }
}
