use chrono::{DateTime, Utc};
use crate::types::pair::Pair;

/// Format of the `updated` field served by the read API.
pub const UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Latest rate reported by one exchange for one pair.
#[derive(Clone, Debug, PartialEq)]
pub struct RateSample {
    pub pair: Pair,
    pub exchange: String,
    pub rate: f64,
    pub observed_at: DateTime<Utc>,
}

impl RateSample {
    pub fn new(pair: Pair, exchange: impl Into<String>, rate: f64, observed_at: DateTime<Utc>) -> Self {
        RateSample {
            pair,
            exchange: exchange.into(),
            rate,
            observed_at,
        }
    }

    /// Storage key: one row per (pair, exchange).
    pub fn key(&self) -> (Pair, String) {
        (self.pair.clone(), self.exchange.clone())
    }

    pub fn formatted_updated(&self) -> String {
        self.observed_at.format(UPDATED_FORMAT).to_string()
    }
}

/// Parses an exchange-provided rate string. Only finite, non-negative values are accepted;
/// `-0` comes back as `0`.
pub fn parse_rate(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite() && *rate >= 0.0)
        .map(f64::abs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("7798.72988289"), Some(7798.72988289));
        assert_eq!(parse_rate("494400"), Some(494400.0));
        assert_eq!(parse_rate("0"), Some(0.0));
    }

    #[test]
    fn test_parse_rate_negative_zero_is_zero() {
        for raw in ["-0", "-0.0", "-0e5"] {
            let rate = parse_rate(raw).unwrap();
            assert_eq!(rate, 0.0);
            assert!(rate.is_sign_positive(), "{} kept its sign", raw);
        }
    }

    #[test]
    fn test_parse_rate_rejects_garbage() {
        assert_eq!(parse_rate("abc"), None);
        assert_eq!(parse_rate(""), None);
        assert_eq!(parse_rate("NaN"), None);
        assert_eq!(parse_rate("inf"), None);
        assert_eq!(parse_rate("-1.5"), None);
    }

    #[test]
    fn test_formatted_updated() {
        let observed_at = Utc.with_ymd_and_hms(2019, 12, 8, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(42);
        let sample = RateSample::new(Pair::new("BTC", "USD"), "Exmo", 1.0, observed_at);

        assert_eq!(sample.formatted_updated(), "2019-12-08 12:30:05.042");
    }
}
