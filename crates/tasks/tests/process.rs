//! End-to-end sweep scenarios over the mock handler.

use std::sync::Arc;
use std::time::Duration;

use tbtc_relayer_chains::{ChainRegistry, ChainRegistryBuilder};
use tbtc_relayer_db::traits::{AuditLogStore, DepositStore};
use tbtc_relayer_db::types::{AuditEventType, AuditFilter, DepositStatus};
use tbtc_relayer_db::MemoryDb;
use tbtc_relayer_lifecycle::{AuditLogger, LifecycleApi};
use tbtc_relayer_primitives::ChainFamily;
use tbtc_relayer_tasks::{
    run_past_deposits_tick, run_process_tick, CleanupThresholds, Scheduler, SchedulerConfig,
};
use tbtc_relayer_test_utils::{valid_reveal_request, MockChainHandler};
use tokio::sync::watch;

fn registry_with(handler: Arc<MockChainHandler>) -> ChainRegistry {
    let mut builder = ChainRegistryBuilder::new();
    builder.register(handler).unwrap();
    builder.build()
}

#[tokio::test]
async fn happy_evm_deposit_reaches_finalized_after_one_tick() {
    let db = Arc::new(MemoryDb::new());
    let handler = Arc::new(MockChainHandler::new("MockEVM", ChainFamily::Evm, db.clone()));
    let registry = registry_with(handler.clone());
    let api = LifecycleApi::new(db.clone(), db.clone(), registry.clone());

    let outcome = api
        .reveal_deposit("MockEVM", valid_reveal_request())
        .await
        .unwrap();

    run_process_tick(&registry).await;

    let stored = db.get_deposit(&outcome.deposit_id).unwrap().unwrap();
    assert_eq!(stored.status, DepositStatus::Finalized);
    assert_eq!(
        stored.hashes.eth.initialize_tx_hash.as_deref(),
        Some(handler.init_tx_hash.as_str())
    );
    assert_eq!(
        stored.hashes.eth.finalize_tx_hash.as_deref(),
        Some(handler.finalize_tx_hash.as_str())
    );

    let events = db.get_events(&AuditFilter::default()).unwrap();
    let types: Vec<_> = events.iter().map(|e| e.event.event_type).collect();
    assert_eq!(
        types,
        vec![
            AuditEventType::DepositCreated,
            AuditEventType::StatusChange,
            AuditEventType::DepositInitialized,
            AuditEventType::StatusChange,
            AuditEventType::DepositFinalized,
        ]
    );
    assert_eq!(events[1].event.data["from"], "QUEUED");
    assert_eq!(events[1].event.data["to"], "INITIALIZED");
    assert_eq!(events[3].event.data["from"], "INITIALIZED");
    assert_eq!(events[3].event.data["to"], "FINALIZED");
}

#[tokio::test]
async fn bridging_chain_needs_two_ticks_to_bridge() {
    let db = Arc::new(MemoryDb::new());
    let handler = Arc::new(MockChainHandler::new(
        "MockSolana",
        ChainFamily::Solana,
        db.clone(),
    ));
    let registry = registry_with(handler.clone());
    let api = LifecycleApi::new(db.clone(), db.clone(), registry.clone());

    let outcome = api
        .reveal_deposit("MockSolana", valid_reveal_request())
        .await
        .unwrap();

    // Tick 1: finalize runs after bridging, so the deposit finalizes and
    // enters the VAA wait on the next bridging pass.
    run_process_tick(&registry).await;
    let stored = db.get_deposit(&outcome.deposit_id).unwrap().unwrap();
    assert_eq!(stored.status, DepositStatus::Finalized);

    run_process_tick(&registry).await;
    let stored = db.get_deposit(&outcome.deposit_id).unwrap().unwrap();
    assert_eq!(stored.status, DepositStatus::AwaitingWormholeVaa);
    assert_eq!(stored.wormhole.transfer_sequence.as_deref(), Some("123"));

    run_process_tick(&registry).await;
    let stored = db.get_deposit(&outcome.deposit_id).unwrap().unwrap();
    assert_eq!(stored.status, DepositStatus::Bridged);
    assert!(stored.wormhole.bridging_attempted);
    assert!(stored.hashes.solana.bridge_tx_hash.is_some());
}

#[tokio::test]
async fn failed_initialize_sweep_keeps_record_queued_for_retry() {
    let db = Arc::new(MemoryDb::new());
    let handler = Arc::new(MockChainHandler::new("MockEVM", ChainFamily::Evm, db.clone()));
    *handler.fail_initialize.lock() = Some("nonce too low".into());
    let registry = registry_with(handler.clone());
    let api = LifecycleApi::new(db.clone(), db.clone(), registry.clone());

    let err = api
        .reveal_deposit("MockEVM", valid_reveal_request())
        .await
        .unwrap_err();
    drop(err);

    run_process_tick(&registry).await;
    let queued = db
        .get_deposits_by_status(DepositStatus::Queued, Some("MockEVM"))
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert!(queued[0].error.as_deref().unwrap().contains("nonce too low"));

    // The chain recovers; the next sweep drains the queue.
    *handler.fail_initialize.lock() = None;
    run_process_tick(&registry).await;
    let queued = db
        .get_deposits_by_status(DepositStatus::Queued, Some("MockEVM"))
        .unwrap();
    assert!(queued.is_empty());
}

#[tokio::test]
async fn past_deposits_tick_respects_capability_and_block_validity() {
    let db = Arc::new(MemoryDb::new());
    let handler = Arc::new(MockChainHandler::new("MockEVM", ChainFamily::Evm, db.clone()));
    let registry = registry_with(handler.clone());

    run_past_deposits_tick(&registry, 60).await;
    {
        let checks = handler.past_checks.lock();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].past_time_minutes, 60);
        assert_eq!(checks[0].latest_block, 1_000);
    }

    // Unknown chain head: the sweep is skipped.
    *handler.latest_block.lock() = 0;
    run_past_deposits_tick(&registry, 60).await;
    assert_eq!(handler.past_checks.lock().len(), 1);
}

#[tokio::test]
async fn scheduler_tasks_stop_on_shutdown() {
    let db = Arc::new(MemoryDb::new());
    let handler = Arc::new(MockChainHandler::new("MockEVM", ChainFamily::Evm, db.clone()));
    let registry = registry_with(handler);

    let scheduler = Scheduler::new(
        registry,
        db.clone(),
        AuditLogger::new(db.clone()),
        SchedulerConfig {
            process_interval: Duration::from_millis(10),
            past_deposits_interval: Duration::from_millis(10),
            cleanup_interval: Duration::from_millis(10),
            past_time_minutes: 60,
            cleanup: CleanupThresholds::default(),
        },
    );

    let (tx, rx) = watch::channel(false);
    let handles = scheduler.spawn(rx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(true).unwrap();

    for handle in handles {
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should stop after shutdown")
            .unwrap();
    }
}
