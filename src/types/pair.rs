use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency pair identified by its base (`from`) and quote (`to`) codes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    pub from: String,
    pub to: String,
}

impl Pair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Pair {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Upper-cased copy, the form every connector expects.
    pub fn normalized(&self) -> Self {
        Pair {
            from: self.from.trim().to_uppercase(),
            to: self.to.trim().to_uppercase(),
        }
    }

    /// `BTCUSDT`
    pub fn concatenated(&self) -> String {
        format!("{}{}", self.from, self.to)
    }

    /// `BTC_USDT`
    pub fn underscored(&self) -> String {
        format!("{}_{}", self.from, self.to)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("invalid pair {0:?}, expected FROM/TO")]
pub struct InvalidPair(pub String);

/// Inverse of `Display`: `BTC/USD`.
impl FromStr for Pair {
    type Err = InvalidPair;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((from, to)) if !from.is_empty() && !to.is_empty() && !to.contains('/') => {
                Ok(Pair::new(from, to))
            }
            _ => Err(InvalidPair(s.to_string())),
        }
    }
}
