//! Rate strings accepted by the parser come back unchanged from the store.

use chrono::Utc;
use proptest::prelude::*;

use exrate_monitor::interfaces::RateStore;
use exrate_monitor::storage::MemoryRateStore;
use exrate_monitor::types::rate::parse_rate;
use exrate_monitor::types::{Pair, RateSample};

fn store_and_read_back(rate: f64) -> f64 {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(async {
        let store = MemoryRateStore::new();
        store
            .upsert(&RateSample::new(Pair::new("BTC", "USD"), "Exmo", rate, Utc::now()))
            .await
            .unwrap();
        store.list_all().await.unwrap()[0].rate
    })
}

proptest! {
    #[test]
    fn decimal_strings_round_trip(raw in "[0-9]{1,9}(\\.[0-9]{1,9})?") {
        let expected: f64 = raw.parse().unwrap();
        let parsed = parse_rate(&raw).unwrap();

        prop_assert_eq!(parsed.to_bits(), expected.to_bits());
        prop_assert_eq!(store_and_read_back(parsed).to_bits(), expected.to_bits());
    }

    #[test]
    fn displayed_floats_round_trip(rate in 0.0f64..1.0e12) {
        let parsed = parse_rate(&rate.to_string()).unwrap();

        prop_assert_eq!(parsed.to_bits(), rate.to_bits());
        prop_assert_eq!(store_and_read_back(parsed).to_bits(), rate.to_bits());
    }

    #[test]
    fn negative_rates_are_rejected(rate in -1.0e12f64..-1.0e-9) {
        prop_assert_eq!(parse_rate(&rate.to_string()), None);
    }
}
