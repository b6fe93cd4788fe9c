//! Demo session
//!
//! A short scripted run through every RPC: two strategies trade, one breaches
//! a limit, cancels and replaces, and finally the kill switch is pulled.

use log::{info, warn};
use rust_decimal_macros::dec;
use tollgate_core::{Position, Signal};
use tollgate_gateway::{ExecutionClient, GatewayError};

/// What the session observed
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub accepted: usize,
    pub rejected: usize,
    pub positions: Vec<Position>,
}

pub async fn run_demo_session(client: &ExecutionClient) -> Result<SessionReport, GatewayError> {
    let mut report = SessionReport::default();

    let signals = [
        Signal::buy("momentum", "AAPL", dec!(100)).with_reference_price(dec!(190)),
        Signal::sell("mean-rev", "MSFT", dec!(40)).with_reference_price(dec!(410)),
        Signal::buy("momentum", "AAPL", dec!(2_000)).with_reference_price(dec!(191)),
    ];

    let mut first_order = None;
    for signal in &signals {
        let response = client.submit_signal(signal).await?;
        if response.accepted {
            report.accepted += 1;
            info!(
                "{} {} {} {} -> {}",
                signal.strategy_id,
                signal.side,
                signal.target_quantity,
                signal.symbol,
                response.order_id.as_deref().unwrap_or("?")
            );
            if first_order.is_none() {
                first_order = response.order_id;
            }
        } else {
            report.rejected += 1;
            warn!(
                "{} {} {} {} rejected: {}",
                signal.strategy_id,
                signal.side,
                signal.target_quantity,
                signal.symbol,
                response.rejection_reason.as_deref().unwrap_or("unknown")
            );
        }
    }

    if let Some(order_id) = first_order {
        let replaced = client
            .replace_order(
                &order_id,
                &Signal::buy("momentum", "AAPL", dec!(150)).with_reference_price(dec!(189)),
            )
            .await?;
        info!("Replace {} accepted: {}", order_id, replaced.accepted);

        // The replaced order is terminal now
        let cancel = client.cancel_order("momentum", &order_id).await?;
        info!(
            "Cancel of replaced order: {}",
            cancel.rejection_reason.as_deref().unwrap_or("accepted")
        );
    }

    let state = client
        .activate_kill_switch("end of demo session", "runner")
        .await?;
    info!("Kill switch active: {}", state.is_active());

    let blocked = client
        .submit_signal(&Signal::buy("momentum", "AAPL", dec!(1)))
        .await?;
    if !blocked.accepted {
        report.rejected += 1;
    }

    report.positions = client.get_all_positions().await?;
    Ok(report)
}
