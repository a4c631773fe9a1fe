pub mod binance;
pub mod exmo;
pub mod http;

use std::collections::HashMap;
use async_trait::async_trait;
use reqwest::{Client, Request};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use crate::error::{Error, Result};
use crate::price_infra::connectors::http::RawQuote;
use crate::types::Pair;

/// One exchange's fetch-and-parse contract.
///
/// `crawl` returns a partial mapping: pairs the exchange could not resolve are
/// logged and left out. An `Err` means the whole call produced nothing usable.
#[async_trait]
pub trait Crawler: Send + Sync {
    async fn crawl(&self, pairs: &[Pair], cancel: &CancellationToken) -> Result<HashMap<Pair, f64>>;

    /// Stable exchange name used as the storage, log and metric label.
    fn exchange(&self) -> &str;
}

/// Reason a single pair was left out of a crawl result.
#[derive(Error, Debug, PartialEq)]
pub enum PairSkip {
    #[error("api error: {0}")]
    ApiError(String),

    #[error("pair not listed")]
    NotListed,

    #[error("unexpected format")]
    UnexpectedFormat,

    #[error("{0} not found")]
    MissingField(&'static str),

    #[error("{0} is not a string")]
    WrongType(&'static str),

    #[error("{field} can't be parsed: {raw:?}")]
    Unparsable {
        field: &'static str,
        raw: String,
    },
}

/// Reads a string-encoded rate from `field` of a JSON object.
pub(crate) fn rate_field(data: &RawQuote, field: &'static str) -> std::result::Result<f64, PairSkip> {
    let raw = data
        .get(field)
        .ok_or(PairSkip::MissingField(field))?
        .as_str()
        .ok_or(PairSkip::WrongType(field))?;

    crate::types::rate::parse_rate(raw).ok_or_else(|| PairSkip::Unparsable {
        field,
        raw: raw.to_string(),
    })
}

/// `http::get_json` that gives up as soon as `cancel` fires.
pub(crate) async fn fetch_cancellable(
    client: &Client,
    request: Request,
    cancel: &CancellationToken,
) -> Result<RawQuote> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = http::get_json(client, request) => result,
    }
}

pub(crate) fn trim_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}
