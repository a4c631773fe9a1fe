use std::path::Path;
use std::time::Duration;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use crate::config::{LoggingConfig, MetricsConfig, ServerConfig};
use crate::error::{Error, Result};
use crate::price_infra::SourcesConfig;
use crate::storage::{StorageBackend, StorageConfig};
use crate::types::Pair;

pub const ENV_PREFIX: &str = "EXMON";

fn default_update_interval_ms() -> u64 {
    60_000
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub pairs: Vec<Pair>,
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Layers `path`, the optional sibling file named after `env`, and `EXMON_*` variables
    /// (`EXMON_SERVER__LISTEN_ADDR` for nested keys).
    pub fn load(path: &str, env: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(File::with_name(path));

        if let Some(env) = env {
            let env_file = Path::new(path).with_file_name(env);
            builder = builder.add_source(File::with_name(&env_file.to_string_lossy()).required(false));
        }

        Self::build(builder.add_source(environment()))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        let mut app: AppConfig = config
            .try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        app.pairs = normalize_pairs(&app.pairs);
        app.validate()?;
        Ok(app)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.pairs.is_empty() {
            return Err(Error::ConfigError("at least one pair must be configured".to_string()));
        }

        if let Some(pair) = self.pairs.iter().find(|p| p.from.is_empty() || p.to.is_empty()) {
            return Err(Error::ConfigError(format!("incomplete pair: {:?}", pair)));
        }

        if self.update_interval_ms == 0 {
            return Err(Error::ConfigError("update_interval_ms must be positive".to_string()));
        }

        if self.sources.request_timeout_ms == 0 {
            return Err(Error::ConfigError("sources.request_timeout_ms must be positive".to_string()));
        }

        for (name, limits) in [("server", &self.server.limits), ("metrics", &self.metrics.limits)] {
            if limits.request_timeout_ms == 0 || limits.max_concurrent_requests == 0 {
                return Err(Error::ConfigError(format!("{}.limits must be positive", name)));
            }
        }

        if self.storage.backend == StorageBackend::Postgres {
            let postgres = &self.storage.postgres;
            if postgres.host.is_empty() || postgres.database.is_empty() {
                return Err(Error::ConfigError("storage.postgres needs a host and a database".to_string()));
            }
        }

        Ok(())
    }
}

/// `EXMON_UPDATE_INTERVAL_MS`, `EXMON_SERVER__LISTEN_ADDR`: one `_` after the prefix,
/// `__` between nested keys.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Upper-cases currency codes and drops repeated pairs, keeping the configured order.
pub fn normalize_pairs(pairs: &[Pair]) -> Vec<Pair> {
    let mut normalized: Vec<Pair> = Vec::with_capacity(pairs.len());
    for pair in pairs.iter().map(Pair::normalized) {
        if !normalized.contains(&pair) {
            normalized.push(pair);
        }
    }
    normalized
}
