//! Integration tests for the heartbeat service and scheduler.
//!
//! The gateway and encoder are in-process mocks. Scheduling tests run on
//! tokio's paused clock so ten-second periods complete instantly.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use async_trait::async_trait;
use statusheart::heartbeat::{self, HeartbeatHandle, HeartbeatService, REPORT_STATUS_INTERVAL};
use statusheart::gateway::TransactionGateway;
use statusheart_core::{
    AbiCallEncoder, Address, B256, Bytes, CallEncoder, IdentityStore, REPORT_DESCRIPTION,
    STATUS_HEART_ADDRESS, SharedIdentity, SignedIdentity, SolCall, StatusHeartCall,
    StatusHeartError, TxHash, TxReceipt, TxRequest, U256, genHashExtCall, reportStatusCall,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// MOCKS
// =============================================================================

#[derive(Clone, Copy, Default)]
enum ReceiptBehavior {
    #[default]
    Confirm,
    Revert,
    Fail,
    Panic,
}

#[derive(Default)]
struct MockGateway {
    sends: Mutex<Vec<(Instant, TxRequest)>>,
    calls: Mutex<Vec<TxRequest>>,
    fail_sends: AtomicBool,
    send_delay: Option<Duration>,
    receipt: ReceiptBehavior,
    waits: AtomicUsize,
}

impl MockGateway {
    fn with_receipt(receipt: ReceiptBehavior) -> Self {
        Self {
            receipt,
            ..Default::default()
        }
    }

    fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    fn send_times(&self) -> Vec<Instant> {
        self.sends.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    fn last_report(&self) -> reportStatusCall {
        let sends = self.sends.lock().unwrap();
        let (_, request) = sends.last().unwrap();
        reportStatusCall::abi_decode(&request.data).unwrap()
    }
}

#[async_trait]
impl TransactionGateway for MockGateway {
    async fn send(&self, request: &TxRequest) -> Result<TxHash, StatusHeartError> {
        let n = {
            let mut sends = self.sends.lock().unwrap();
            sends.push((Instant::now(), request.clone()));
            sends.len()
        };
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(StatusHeartError::Submission("node unreachable".to_string()));
        }
        Ok(TxHash::repeat_byte(n as u8))
    }

    async fn call(&self, request: &TxRequest) -> Result<Bytes, StatusHeartError> {
        self.calls.lock().unwrap().push(request.clone());
        Ok(Bytes::copy_from_slice(B256::repeat_byte(0xab).as_slice()))
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, StatusHeartError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        match self.receipt {
            ReceiptBehavior::Confirm => Ok(TxReceipt {
                tx_hash,
                block_number: Some(7),
                success: true,
            }),
            ReceiptBehavior::Revert => Ok(TxReceipt {
                tx_hash,
                block_number: Some(7),
                success: false,
            }),
            ReceiptBehavior::Fail => Err(StatusHeartError::Confirmation("timed out".to_string())),
            ReceiptBehavior::Panic => panic!("receipt watcher exploded"),
        }
    }
}

/// ABI encoder that counts calls and fails on the listed call numbers (1-based).
#[derive(Default)]
struct FlakyEncoder {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
}

impl CallEncoder for FlakyEncoder {
    fn encode(&self, call: &StatusHeartCall) -> Result<Bytes, StatusHeartError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&n) {
            return Err(StatusHeartError::Encoding(format!("call {n} rejected")));
        }
        AbiCallEncoder.encode(call)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn chain_address() -> Address {
    Address::repeat_byte(0x42)
}

fn identity(nonce: u32) -> SignedIdentity {
    SignedIdentity {
        peer_id: "p1".to_string(),
        created_time: 100,
        version: "1.0".to_string(),
        nonce,
        chain_address: chain_address().to_string(),
        signed_time: 200,
        signature: "0x0102030405".to_string(),
    }
}

fn contract() -> Address {
    STATUS_HEART_ADDRESS.parse().unwrap()
}

fn service(
    gateway: &Arc<MockGateway>,
    store: &SharedIdentity,
    encoder: &Arc<FlakyEncoder>,
) -> HeartbeatService {
    HeartbeatService::new(
        contract(),
        gateway.clone(),
        Arc::new(store.clone()),
        encoder.clone(),
    )
}

async fn start(
    gateway: &Arc<MockGateway>,
    store: &SharedIdentity,
    encoder: &Arc<FlakyEncoder>,
) -> Result<HeartbeatHandle, StatusHeartError> {
    let identity: Arc<dyn IdentityStore> = Arc::new(store.clone());
    heartbeat::init(
        STATUS_HEART_ADDRESS,
        gateway.clone(),
        identity,
        encoder.clone(),
    )
    .await
}

/// Let detached confirmation tasks run to completion.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// =============================================================================
// REPORT STATUS
// =============================================================================

#[tokio::test]
async fn test_empty_identity_skips_without_encoding() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::new();

    let tx_hash = service(&gateway, &store, &encoder)
        .report_status()
        .await
        .unwrap();

    assert_eq!(tx_hash, TxHash::ZERO);
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(gateway.send_count(), 0);
}

#[tokio::test]
async fn test_report_submits_encoded_identity() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));
    let service = service(&gateway, &store, &encoder);

    let tx_hash = service.report_status().await.unwrap();
    assert_ne!(tx_hash, TxHash::ZERO);

    {
        let sends = gateway.sends.lock().unwrap();
        let (_, request) = &sends[0];
        assert_eq!(request.to, contract());
        assert_eq!(request.value, U256::ZERO);
        assert_eq!(request.description, REPORT_DESCRIPTION);
    }

    let decoded = gateway.last_report();
    assert_eq!(decoded.peer, "p1");
    assert_eq!(decoded.createTime, 100);
    assert_eq!(decoded.version, "1.0");
    assert_eq!(decoded.num, 1);
    assert_eq!(decoded.bttcAddress, chain_address());
    assert_eq!(decoded.signedTime, 200);
    assert_eq!(&decoded.signature[..], &[1, 2, 3, 4, 5]);

    let stats = service.stats();
    assert_eq!(stats.submitted, 1);
    assert_eq!(stats.last_tx_hash, Some(tx_hash));
}

#[tokio::test]
async fn test_submission_failure_returns_error() {
    let gateway = Arc::new(MockGateway::default());
    gateway.fail_sends.store(true, Ordering::SeqCst);
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));
    let service = service(&gateway, &store, &encoder);

    let err = service.report_status().await.unwrap_err();
    assert!(matches!(err, StatusHeartError::Submission(_)));

    let err = service.check_report_status().await.unwrap_err();
    assert!(matches!(err, StatusHeartError::Submission(_)));

    let stats = service.stats();
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.submitted, 0);
    assert!(stats.last_error.unwrap().contains("node unreachable"));
    // No confirmation watcher for a rejected transaction
    settle().await;
    assert_eq!(gateway.waits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_signature_aborts_cycle() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let mut bad = identity(1);
    bad.signature = "0xnothex".to_string();
    let store = SharedIdentity::with_identity(bad);

    let err = service(&gateway, &store, &encoder)
        .report_status()
        .await
        .unwrap_err();

    assert!(err.is_encoding());
    assert_eq!(gateway.send_count(), 0);
}

#[tokio::test]
async fn test_gen_hash_ext_is_read_only() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(3));

    let digest = service(&gateway, &store, &encoder)
        .gen_hash_ext()
        .await
        .unwrap();

    assert_eq!(digest, B256::repeat_byte(0xab));
    assert_eq!(gateway.send_count(), 0);
    let calls = gateway.calls.lock().unwrap();
    let decoded = genHashExtCall::abi_decode(&calls[0].data).unwrap();
    assert_eq!(decoded.num, 3);
    assert_eq!(decoded.bttcAddress, chain_address());
}

// =============================================================================
// CONFIRMATION WATCHER
// =============================================================================

#[tokio::test]
async fn test_confirmation_outcomes_are_recorded() {
    for (behavior, confirmed, reverted, failures) in [
        (ReceiptBehavior::Confirm, 1, 0, 0),
        (ReceiptBehavior::Revert, 0, 1, 0),
        (ReceiptBehavior::Fail, 0, 0, 1),
    ] {
        let gateway = Arc::new(MockGateway::with_receipt(behavior));
        let encoder = Arc::new(FlakyEncoder::default());
        let store = SharedIdentity::with_identity(identity(1));
        let service = service(&gateway, &store, &encoder);

        service.report_status().await.unwrap();
        settle().await;

        let stats = service.stats();
        assert_eq!(
            (stats.confirmed, stats.reverted, stats.confirmation_failures),
            (confirmed, reverted, failures)
        );
    }
}

#[tokio::test]
async fn test_confirmation_panic_is_contained() {
    let gateway = Arc::new(MockGateway::with_receipt(ReceiptBehavior::Panic));
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));
    let service = service(&gateway, &store, &encoder);

    let first = service.report_status().await.unwrap();
    settle().await;

    assert_eq!(gateway.waits.load(Ordering::SeqCst), 1);
    assert_eq!(service.stats().confirmation_failures, 1);

    // The reporter keeps working after the watcher blew up
    let second = service.report_status().await.unwrap();
    assert_ne!(first, second);
    settle().await;
    assert_eq!(service.stats().confirmation_failures, 2);
}

#[tokio::test]
async fn test_submitted_report_hands_back_its_watcher() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));
    let service = service(&gateway, &store, &encoder);

    let report = service.submit_report().await.unwrap().unwrap();
    let receipt = report.confirmation.await.unwrap().unwrap();

    assert_eq!(receipt.tx_hash, report.tx_hash);
    assert!(receipt.success);
    // The caller observes the same watcher; the hash is polled once
    assert_eq!(gateway.waits.load(Ordering::SeqCst), 1);
    assert_eq!(service.stats().confirmed, 1);
}

#[tokio::test]
async fn test_submitted_report_watcher_yields_none_on_failure() {
    for behavior in [ReceiptBehavior::Fail, ReceiptBehavior::Panic] {
        let gateway = Arc::new(MockGateway::with_receipt(behavior));
        let encoder = Arc::new(FlakyEncoder::default());
        let store = SharedIdentity::with_identity(identity(1));
        let service = service(&gateway, &store, &encoder);

        let report = service.submit_report().await.unwrap().unwrap();

        assert!(report.confirmation.await.unwrap().is_none());
        assert_eq!(service.stats().confirmation_failures, 1);
    }
}

#[tokio::test]
async fn test_submit_report_skips_unestablished_identity() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::new();

    let report = service(&gateway, &store, &encoder)
        .submit_report()
        .await
        .unwrap();

    assert!(report.is_none());
    assert_eq!(gateway.waits.load(Ordering::SeqCst), 0);
}

// =============================================================================
// INITIALIZATION
// =============================================================================

#[tokio::test]
async fn test_init_rejects_missing_address() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));

    let result = heartbeat::init(
        "",
        gateway.clone(),
        Arc::new(store.clone()),
        encoder.clone(),
    )
    .await;

    assert!(matches!(result, Err(StatusHeartError::Config(_))));
    assert_eq!(gateway.send_count(), 0);
}

#[tokio::test]
async fn test_init_fails_when_startup_check_fails() {
    let gateway = Arc::new(MockGateway::default());
    gateway.fail_sends.store(true, Ordering::SeqCst);
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));

    let result = start(&gateway, &store, &encoder).await;

    assert!(matches!(result, Err(StatusHeartError::Submission(_))));
    assert_eq!(gateway.send_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_init_reports_immediately_then_on_period() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));

    let handle = start(&gateway, &store, &encoder).await.unwrap();
    assert_eq!(gateway.send_count(), 1);

    tokio::time::sleep(REPORT_STATUS_INTERVAL * 3 + Duration::from_secs(5)).await;

    let times = gateway.send_times();
    assert!(times.len() >= 4, "expected 4 reports, got {}", times.len());
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= REPORT_STATUS_INTERVAL);
    }

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unestablished_identity_starts_and_reports_later() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::new();

    let handle = start(&gateway, &store, &encoder).await.unwrap();
    assert_eq!(gateway.send_count(), 0);
    assert_eq!(handle.service().stats().skipped, 1);

    store.publish(identity(9));
    tokio::time::sleep(REPORT_STATUS_INTERVAL + Duration::from_secs(1)).await;

    assert_eq!(gateway.send_count(), 1);
    assert_eq!(gateway.last_report().num, 9);

    handle.shutdown().await;
}

// =============================================================================
// SCHEDULER RESILIENCE
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_encoder_failure_does_not_stop_later_ticks() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder {
        fail_on: vec![2],
        ..Default::default()
    });
    let store = SharedIdentity::with_identity(identity(1));

    let handle = start(&gateway, &store, &encoder).await.unwrap();

    // First tick: encoder refuses
    tokio::time::sleep(REPORT_STATUS_INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.send_count(), 1);

    // Second tick: rebuilt from the updated identity
    store.publish(identity(2));
    tokio::time::sleep(REPORT_STATUS_INTERVAL).await;
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 3);
    assert_eq!(gateway.send_count(), 2);
    assert_eq!(gateway.last_report().num, 2);

    let stats = handle.service().stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.submitted, 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_submission_failures_do_not_stop_scheduler() {
    let gateway = Arc::new(MockGateway::default());
    gateway.fail_sends.store(true, Ordering::SeqCst);
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));

    let handle = HeartbeatHandle::start(service(&gateway, &store, &encoder), REPORT_STATUS_INTERVAL);

    tokio::time::sleep(REPORT_STATUS_INTERVAL * 3 + Duration::from_secs(1)).await;
    assert_eq!(gateway.send_count(), 3);
    assert_eq!(handle.service().stats().failed, 3);

    gateway.fail_sends.store(false, Ordering::SeqCst);
    tokio::time::sleep(REPORT_STATUS_INTERVAL).await;
    assert_eq!(gateway.send_count(), 4);
    assert_eq!(handle.service().stats().submitted, 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_reports_serialize_instead_of_queueing() {
    let gateway = Arc::new(MockGateway {
        send_delay: Some(Duration::from_secs(25)),
        ..Default::default()
    });
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));

    let handle = HeartbeatHandle::start(service(&gateway, &store, &encoder), REPORT_STATUS_INTERVAL);

    tokio::time::sleep(Duration::from_secs(100)).await;

    let times = gateway.send_times();
    assert!(times.len() >= 3);
    // 100s at one 25s cycle per tick leaves room for at most four cycles
    assert!(times.len() <= 4, "ticks queued up: {}", times.len());
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(25));
    }

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_ticking() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));

    let handle = HeartbeatHandle::start(service(&gateway, &store, &encoder), REPORT_STATUS_INTERVAL);
    tokio::time::sleep(REPORT_STATUS_INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(gateway.send_count(), 1);

    handle.shutdown().await;
    tokio::time::sleep(REPORT_STATUS_INTERVAL * 5).await;
    assert_eq!(gateway.send_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handle_keeps_reporting() {
    let gateway = Arc::new(MockGateway::default());
    let encoder = Arc::new(FlakyEncoder::default());
    let store = SharedIdentity::with_identity(identity(1));

    drop(HeartbeatHandle::start(
        service(&gateway, &store, &encoder),
        REPORT_STATUS_INTERVAL,
    ));

    tokio::time::sleep(REPORT_STATUS_INTERVAL * 2 + Duration::from_secs(1)).await;
    assert_eq!(gateway.send_count(), 2);
}
