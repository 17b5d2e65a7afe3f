//! The reconciliation scheduler.
//!
//! Three recurring sweeps on distinct cadences, each running inline in its
//! own task so a tick can never overlap itself; ticks missed while a slow
//! sweep runs are skipped, not queued. Every error inside a tick is caught
//! and logged so one failure never stops the loop.

use std::sync::Arc;
use std::time::Duration;

use tbtc_relayer_chains::{ChainRegistry, PastDepositsQuery};
use tbtc_relayer_db::traits::DepositStore;
use tbtc_relayer_lifecycle::cleanup::{run_cleanup, CleanupPolicy};
use tbtc_relayer_lifecycle::AuditLogger;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Age thresholds for the cleanup sweep, in hours.
#[derive(Debug, Clone, Copy)]
pub struct CleanupThresholds {
    pub queued_hours: u64,
    pub finalized_hours: u64,
    pub bridged_hours: u64,
}

impl Default for CleanupThresholds {
    fn default() -> Self {
        Self {
            queued_hours: 48,
            finalized_hours: 12,
            bridged_hours: 12,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub process_interval: Duration,
    pub past_deposits_interval: Duration,
    pub cleanup_interval: Duration,
    /// Back-scan window handed to handlers.
    pub past_time_minutes: u64,
    pub cleanup: CleanupThresholds,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            process_interval: Duration::from_secs(60),
            past_deposits_interval: Duration::from_secs(60 * 60),
            cleanup_interval: Duration::from_secs(10 * 60),
            past_time_minutes: 60,
            cleanup: CleanupThresholds::default(),
        }
    }
}

pub struct Scheduler {
    registry: ChainRegistry,
    deposits: Arc<dyn DepositStore>,
    audit: AuditLogger,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        registry: ChainRegistry,
        deposits: Arc<dyn DepositStore>,
        audit: AuditLogger,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            deposits,
            audit,
            config,
        }
    }

    /// Spawns the three sweep loops. They exit when the shutdown flag
    /// flips, letting any in-flight tick finish first.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let Self {
            registry,
            deposits,
            audit,
            config,
        } = self;

        let process = {
            let registry = registry.clone();
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                info!(period = ?config.process_interval, "starting process task");
                let mut ticker = interval(config.process_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => run_process_tick(&registry).await,
                        _ = shutdown.changed() => break,
                    }
                }
                info!("process task stopped");
            })
        };

        let past_deposits = {
            let registry = registry.clone();
            let mut shutdown = shutdown.clone();
            let past_time_minutes = config.past_time_minutes;
            tokio::spawn(async move {
                info!(period = ?config.past_deposits_interval, "starting past-deposits task");
                let mut ticker = interval(config.past_deposits_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            run_past_deposits_tick(&registry, past_time_minutes).await
                        }
                        _ = shutdown.changed() => break,
                    }
                }
                info!("past-deposits task stopped");
            })
        };

        let cleanup = {
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                info!(period = ?config.cleanup_interval, "starting cleanup task");
                let mut ticker = interval(config.cleanup_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            run_cleanup_tick(&*deposits, &audit, config.cleanup)
                        }
                        _ = shutdown.changed() => break,
                    }
                }
                info!("cleanup task stopped");
            })
        };

        vec![process, past_deposits, cleanup]
    }
}

/// One Process tick. Order matters: bridging drains the tail first, then
/// redemptions, then finalize advances mid-stage work, then initialize
/// admits new work, keeping queue depth bounded.
pub async fn run_process_tick(registry: &ChainRegistry) {
    for handler in registry.handlers() {
        let chain = handler.chain_name();

        if let Err(e) = handler.process_wormhole_bridging().await {
            error!(%chain, err = %e, "wormhole bridging sweep failed");
        }
        if let Err(e) = handler.process_redemptions().await {
            error!(%chain, err = %e, "redemption sweep failed");
        }
        if let Err(e) = handler.process_finalize_deposits().await {
            error!(%chain, err = %e, "finalize sweep failed");
        }
        if let Err(e) = handler.process_initialize_deposits().await {
            error!(%chain, err = %e, "initialize sweep failed");
        }
    }
}

/// One PastDeposits tick: back-scan every chain that supports it.
pub async fn run_past_deposits_tick(registry: &ChainRegistry, past_time_minutes: u64) {
    for handler in registry.handlers() {
        let chain = handler.chain_name();
        if !handler.supports_past_deposit_check() {
            continue;
        }

        let latest_block = match handler.get_latest_block().await {
            Ok(block) => block,
            Err(e) => {
                error!(%chain, err = %e, "could not get latest block");
                continue;
            }
        };

        if latest_block <= 0 {
            debug!(%chain, latest_block, "latest block unknown, skipping back-scan");
            continue;
        }

        if let Err(e) = handler
            .check_for_past_deposits(PastDepositsQuery {
                past_time_minutes,
                latest_block,
            })
            .await
        {
            error!(%chain, err = %e, "past deposit check failed");
        }
    }
}

/// One Cleanup tick over the three age-gated statuses.
pub fn run_cleanup_tick(
    deposits: &dyn DepositStore,
    audit: &AuditLogger,
    thresholds: CleanupThresholds,
) {
    for policy in [
        CleanupPolicy::queued(thresholds.queued_hours),
        CleanupPolicy::finalized(thresholds.finalized_hours),
        CleanupPolicy::bridged(thresholds.bridged_hours),
    ] {
        match run_cleanup(deposits, audit, policy) {
            Ok(stats) if stats.deleted > 0 || stats.failed > 0 => {
                info!(
                    status = policy.status.as_str(),
                    scanned = stats.scanned,
                    deleted = stats.deleted,
                    failed = stats.failed,
                    "cleanup sweep finished"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(status = policy.status.as_str(), err = %e, "cleanup sweep failed");
            }
        }
    }
}
