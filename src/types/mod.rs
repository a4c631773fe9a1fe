pub mod pair;
pub mod rate;

pub use pair::Pair;
pub use rate::RateSample;
