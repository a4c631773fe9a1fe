//! Exchange rate monitor.
//!
//! Polls several exchange APIs on a fixed interval, keeps the latest rate per
//! (pair, exchange) and serves the stored rates over HTTP.

pub mod utils;
pub mod types;
pub mod price_infra;
pub mod storage;
pub mod error;
pub mod config;
pub mod observability;
pub mod interfaces;
pub mod api;
