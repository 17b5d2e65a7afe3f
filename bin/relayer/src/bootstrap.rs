//! Hooks up the stores, handlers, scheduler, and HTTP API, then runs until
//! a shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tbtc_relayer_chains::ChainRegistryBuilder;
use tbtc_relayer_common::shutdown;
use tbtc_relayer_lifecycle::{AuditLogger, LifecycleApi};
use tbtc_relayer_store_sled::SledDb;
use tbtc_relayer_tasks::{CleanupThresholds, Scheduler, SchedulerConfig};
use tracing::info;

use crate::args::Cli;
use crate::config::Config;
use crate::http;
use crate::sim::SimulatedChainHandler;

pub(crate) async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(&cli.config)?;
    if let Some(datadir) = cli.datadir {
        config.store.path = datadir.into();
    }
    if let Some(port) = cli.http_port {
        config.http.port = port;
    }

    let store = Arc::new(SledDb::open(&config.store.path)?);
    let audit = AuditLogger::new(store.clone());
    info!(path = %config.store.path.display(), "record store opened");

    let mut builder = ChainRegistryBuilder::new();
    for chain in &config.chains {
        let handler = SimulatedChainHandler::new(
            chain,
            &config.vaa,
            store.clone(),
            store.clone(),
            audit.clone(),
        )?;
        builder.register(Arc::new(handler))?;
        info!(chain = %chain.name, family = %chain.family, "registered chain handler");
    }
    let registry = builder.build();

    for handler in registry.handlers() {
        handler.initialize().await?;
        handler.setup_listeners().await?;
    }

    let api = Arc::new(LifecycleApi::new(
        store.clone(),
        store.clone(),
        registry.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    tokio::spawn(shutdown::listen_for_signals(shutdown_tx));

    let scheduler = Scheduler::new(
        registry,
        store.clone(),
        audit,
        SchedulerConfig {
            cleanup: CleanupThresholds {
                queued_hours: config.cleanup.clean_queued_hours,
                finalized_hours: config.cleanup.clean_finalized_hours,
                bridged_hours: config.cleanup.clean_bridged_hours,
            },
            ..Default::default()
        },
    );
    let scheduler_handles = scheduler.spawn(shutdown_rx.clone());

    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port).parse()?;
    let mut http_shutdown = shutdown_rx;
    let (bound, server) = warp::serve(http::routes(api)).bind_with_graceful_shutdown(addr, {
        async move {
            let _ = http_shutdown.changed().await;
        }
    });
    info!(%bound, "http api listening");

    server.await;

    // Let in-flight sweeps wind down before flushing the store.
    for handle in scheduler_handles {
        if tokio::time::timeout(Duration::from_secs(30), handle)
            .await
            .is_err()
        {
            tracing::warn!("a scheduler task did not stop within the shutdown deadline");
        }
    }

    store.flush()?;
    info!("relayer stopped");
    Ok(())
}
