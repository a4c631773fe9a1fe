use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::config::LoggingConfig;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig, debug: bool) {
    let default_level = if debug { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = installed {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

pub fn trace_update_cycle(cycle: u64) -> Span {
    tracing::info_span!(
        "update_cycle",
        cycle,
    )
}

pub fn trace_crawl(exchange: &str) -> Span {
    tracing::info_span!(
        "crawl",
        exchange = %exchange,
    )
}
