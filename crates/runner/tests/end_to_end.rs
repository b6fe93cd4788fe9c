//! End-to-end: configuration -> bootstrap -> RPC session -> journal

use rust_decimal_macros::dec;
use tollgate_order_manager::{JournalEvent, to_json_lines};
use tollgate_runner::{GatewayBootstrap, RunnerConfig, run_demo_session};

#[tokio::test]
async fn test_demo_session() {
    let _ = env_logger::try_init();
    let gateway = GatewayBootstrap::with_config(RunnerConfig::default()).unwrap();

    let report = run_demo_session(&gateway.client).await.unwrap();

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected, 2);
    assert_eq!(report.positions.len(), 2);
    assert_eq!(report.positions[0].symbol, "AAPL");
    assert_eq!(report.positions[0].quantity, dec!(150));
    assert_eq!(report.positions[0].avg_price, dec!(189));
    assert_eq!(report.positions[1].symbol, "MSFT");
    assert_eq!(report.positions[1].quantity, dec!(-40));

    let entries = gateway.controller.journal().entries();
    let count = |event| entries.iter().filter(|e| e.event == event).count();
    assert_eq!(count(JournalEvent::OrderAccepted), 2);
    assert_eq!(count(JournalEvent::OrderReplaced), 1);
    assert_eq!(count(JournalEvent::KillSwitchActivated), 1);
    assert_eq!(count(JournalEvent::SignalRejected), 2);

    let lines = to_json_lines(&entries).unwrap();
    assert_eq!(lines.lines().count(), entries.len());

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_json_config_drives_limits() {
    let _ = env_logger::try_init();
    let config = RunnerConfig::from_json(
        r#"{
            "admission": {
                "limits": {
                    "default_instrument_limits": { "max_position": "50", "max_order_size": "50" }
                }
            }
        }"#,
    )
    .unwrap();
    let gateway = GatewayBootstrap::with_config(config).unwrap();

    let report = run_demo_session(&gateway.client).await.unwrap();

    // Only the MSFT sell of 40 fits under a 50 cap
    assert_eq!(report.accepted, 1);
    assert_eq!(report.positions.len(), 2);
    assert!(report.positions[0].is_flat());
    assert_eq!(report.positions[1].symbol, "MSFT");
    assert_eq!(report.positions[1].quantity, dec!(-40));

    gateway.shutdown().await;
}
