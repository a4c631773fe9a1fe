use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use exrate_monitor::api::{self, rest::ApiState};
use exrate_monitor::config::{AppConfig, Cli};
use exrate_monitor::observability::{self, metrics::PrometheusObserver};
use exrate_monitor::price_infra::{self, updater::Updater};
use exrate_monitor::storage;
use exrate_monitor::utils::task_supervisor::TaskSupervisor;

/// How long running tasks get to finish after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config, cli.env.as_deref())
        .with_context(|| format!("can't load config {}", cli.config))?;
    observability::tracing::init(&config.logging, cli.debug);

    info!(
        pairs = %config.pairs.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
        update_interval_ms = config.update_interval_ms,
        "starting exchange rate monitor"
    );

    // Bind both listeners before any background work starts so a taken port fails fast.
    let api_listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("can't bind {}", config.server.listen_addr))?;
    let metrics_listener = TcpListener::bind(config.metrics.listen_addr)
        .await
        .with_context(|| format!("can't bind {}", config.metrics.listen_addr))?;

    let store = storage::open(&config.storage)
        .await
        .context("can't open rate storage")?;
    let client = price_infra::build_http_client(&config.sources)?;
    let updater = Updater::new(
        Arc::clone(&store),
        config.pairs.clone(),
        price_infra::default_crawlers(client, &config.sources),
        config.update_interval(),
        Arc::new(PrometheusObserver::new()),
    )?;

    let cancel = CancellationToken::new();
    let mut supervisor = TaskSupervisor::new();
    supervisor
        .spawn(
            "http_server",
            api::rest::serve(
                api_listener,
                Arc::new(ApiState { store }),
                config.server.limits.clone(),
                cancel.clone(),
            ),
        )
        .spawn(
            "metrics_server",
            api::metrics::serve(metrics_listener, config.metrics.limits.clone(), cancel.clone()),
        )
        .spawn("updater", {
            let cancel = cancel.clone();
            async move {
                updater.run(cancel).await;
                Ok(())
            }
        });

    tokio::select! {
        _ = shutdown_signal() => info!("received shutdown signal, draining"),
        Some(exit) = supervisor.wait_next() => {
            warn!(task = %exit.name, result = ?exit.result, "task exited early, shutting down");
        }
    }

    cancel.cancel();
    supervisor.shutdown(SHUTDOWN_GRACE).await?;

    info!("shutdown complete");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "can't register SIGTERM handler, waiting for ctrl+c only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
