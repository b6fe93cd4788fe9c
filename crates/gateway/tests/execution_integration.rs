//! Integration test: Client <-> Execution Service
//!
//! Tests the full round-trip:
//! Strategy -> ExecutionClient -> channel -> ExecutionService -> AdmissionController

use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tollgate_core::{OrderId, OrderStatus, Signal};
use tollgate_gateway::{ExecutionClient, ExecutionService, GatewayError};
use tollgate_order_manager::{AdmissionConfig, AdmissionController, RejectionCode};
use tollgate_risk_manager::{InstrumentLimits, RiskLimits};

fn start() -> (ExecutionClient, Arc<AdmissionController>) {
    let controller = Arc::new(AdmissionController::new(
        AdmissionConfig::default().with_limits(
            RiskLimits::default().with_instrument("AAPL", InstrumentLimits::max_position(dec!(500))),
        ),
    ));
    let (requester, _handle) = ExecutionService::new(controller.clone()).spawn(64);
    let client = ExecutionClient::new(requester.with_timeout(Duration::from_secs(5)));
    (client, controller)
}

#[tokio::test]
async fn test_rpc_limit_scenario() {
    let _ = env_logger::try_init();
    let (client, _) = start();

    let first = client
        .submit_signal(&Signal::buy("sma", "AAPL", dec!(100)))
        .await
        .unwrap();
    assert!(first.accepted);
    let first_id = first.order_id.clone().unwrap();

    let breach = client
        .submit_signal(&Signal::buy("sma", "AAPL", dec!(450)))
        .await
        .unwrap();
    assert!(!breach.accepted);
    assert!(breach.order_id.is_none());
    assert_eq!(breach.rejection_code, Some(RejectionCode::RiskLimitExceeded));
    assert!(
        breach
            .rejection_reason
            .as_deref()
            .unwrap()
            .contains("max position")
    );

    let cancel = client.cancel_order("sma", &first_id).await.unwrap();
    assert!(cancel.accepted);

    let retry = client
        .submit_signal(&Signal::buy("sma", "AAPL", dec!(450)))
        .await
        .unwrap();
    assert!(retry.accepted);

    let position = client.get_position("AAPL").await.unwrap();
    assert_eq!(position.quantity, dec!(450));

    let first_id: OrderId = first_id.parse().unwrap();
    let order = client.get_order_status(&first_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_rpc_replace_and_positions() {
    let _ = env_logger::try_init();
    let (client, _) = start();

    let original = client
        .submit_signal(&Signal::sell("sma", "MSFT", dec!(20)))
        .await
        .unwrap();
    let original_id = original.order_id.unwrap();

    let replaced = client
        .replace_order(&original_id, &Signal::buy("sma", "AAPL", dec!(30)))
        .await
        .unwrap();
    assert!(replaced.accepted);
    assert_ne!(replaced.order_id.as_deref(), Some(original_id.as_str()));

    let positions = client.get_all_positions().await.unwrap();
    let symbols: Vec<&str> = positions.iter().map(|p| p.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    assert_eq!(positions[0].quantity, dec!(30));
    assert!(positions[1].is_flat());
}

#[tokio::test]
async fn test_rpc_kill_switch() {
    let _ = env_logger::try_init();
    let (client, controller) = start();

    let ack = client
        .activate_kill_switch("manual halt", "ops")
        .await
        .unwrap();
    assert!(ack.is_active());
    assert_eq!(ack.initiated_by.as_deref(), Some("ops"));

    let response = client
        .submit_signal(&Signal::buy("sma", "AAPL", dec!(1)))
        .await
        .unwrap();
    assert!(!response.accepted);
    assert_eq!(response.rejection_code, Some(RejectionCode::KillSwitchActive));
    assert!(!response.retryable);

    // Clearing is administrative only, done in-process
    controller.clear_kill_switch("ops").await;
    let response = client
        .submit_signal(&Signal::buy("sma", "AAPL", dec!(1)))
        .await
        .unwrap();
    assert!(response.accepted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rpc_concurrent_breaching_submits() {
    let _ = env_logger::try_init();
    let (client, _) = start();

    let a = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .submit_signal(&Signal::buy("a", "AAPL", dec!(300)))
                .await
        })
    };
    let b = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .submit_signal(&Signal::buy("b", "AAPL", dec!(300)))
                .await
        })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert_eq!([a.accepted, b.accepted].iter().filter(|x| **x).count(), 1);
    assert_eq!(
        client.get_position("AAPL").await.unwrap().quantity,
        dec!(300)
    );
}

#[tokio::test]
async fn test_unknown_order_status_is_remote_fault() {
    let _ = env_logger::try_init();
    let (client, _) = start();

    let err = client.get_order_status(&OrderId::new()).await.unwrap_err();
    match err {
        GatewayError::Remote { code, .. } => assert_eq!(code, RejectionCode::OrderNotFound),
        other => panic!("unexpected {other:?}"),
    }
}
