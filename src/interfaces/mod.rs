pub mod rate_store;
pub mod update_observer;

pub use rate_store::RateStore;
pub use update_observer::{NoopObserver, UpdateObserver};
