use std::net::SocketAddr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

pub mod cli;
pub mod loader;

pub use cli::Cli;
pub use loader::AppConfig;

/// Per-listener request limits.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpLimits {
    pub request_timeout_ms: u64,
    /// Requests past this many wait for a free slot.
    pub max_concurrent_requests: usize,
}

impl Default for HttpLimits {
    fn default() -> Self {
        HttpLimits {
            request_timeout_ms: 60_000,
            max_concurrent_requests: 1000,
        }
    }
}

impl HttpLimits {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub limits: HttpLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            limits: HttpLimits::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub listen_addr: SocketAddr,
    pub limits: HttpLimits,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 2112)),
            limits: HttpLimits::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}
