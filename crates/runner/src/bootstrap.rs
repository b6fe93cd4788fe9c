//! Bootstrap - Wires the gateway together
//!
//! Builds the admission controller from configuration, starts the execution
//! service on a channel transport and hands back a connected client.

use crate::config::{ConfigError, RunnerConfig};
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tollgate_gateway::{ExecutionClient, ExecutionService};
use tollgate_order_manager::{AdmissionController, InMemoryJournal, Journal};

/// A running gateway
pub struct GatewayBootstrap {
    /// In-process handle, for administrative operations not exposed over RPC
    pub controller: Arc<AdmissionController>,
    /// Connected RPC client
    pub client: ExecutionClient,
    /// Service loop; ends once every client is dropped
    pub service: JoinHandle<()>,
}

impl GatewayBootstrap {
    /// Start with default configuration
    pub fn start() -> Self {
        let config = RunnerConfig::default();
        let journal = Arc::new(InMemoryJournal::new(config.admission.journal_capacity));
        Self::with_journal(config, journal)
    }

    /// Start with custom configuration, opening the configured journal
    pub fn with_config(config: RunnerConfig) -> Result<Self, ConfigError> {
        let journal = config.open_journal()?;
        Ok(Self::with_journal(config, journal))
    }

    fn with_journal(config: RunnerConfig, journal: Arc<dyn Journal>) -> Self {
        let limits = &config.admission.limits;
        info!(
            "Starting gateway: lock timeout {}ms, default max position {}, {} symbol overrides, {} strategy overrides",
            config.admission.lock_timeout_ms,
            limits.default_instrument_limits.max_position,
            limits.instrument_limits.len(),
            limits.strategy_limits.len()
        );

        let controller = Arc::new(AdmissionController::with_journal(
            config.admission.clone(),
            journal,
        ));
        let (requester, service) =
            ExecutionService::new(controller.clone()).spawn(config.channel_capacity);
        let client = ExecutionClient::new(requester.with_timeout(config.request_timeout()));

        Self {
            controller,
            client,
            service,
        }
    }

    /// Drop the client and wait for the service loop to finish
    pub async fn shutdown(self) {
        drop(self.client);
        if let Err(e) = self.service.await {
            log::warn!("Execution service ended abnormally: {}", e);
        }
        info!("Gateway stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tollgate_core::Signal;

    #[tokio::test]
    async fn test_bootstrap_serves_requests() {
        let gateway = GatewayBootstrap::start();

        let response = gateway
            .client
            .submit_signal(&Signal::buy("sma", "AAPL", dec!(10)))
            .await
            .unwrap();
        assert!(response.accepted);
        assert_eq!(gateway.controller.open_orders().len(), 1);

        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_config_limits_are_applied() {
        let mut config = RunnerConfig::default();
        config.admission.limits.default_instrument_limits.max_position = dec!(5);
        let gateway = GatewayBootstrap::with_config(config).unwrap();

        let response = gateway
            .client
            .submit_signal(&Signal::buy("sma", "AAPL", dec!(10)))
            .await
            .unwrap();
        assert!(!response.accepted);

        gateway.shutdown().await;
    }

    #[tokio::test]
    async fn test_journal_file_is_written() {
        let path = std::env::temp_dir().join(format!(
            "tollgate_bootstrap_{}.jsonl",
            tollgate_core::OrderId::new()
        ));
        let config = RunnerConfig {
            journal_path: Some(path.clone()),
            ..RunnerConfig::default()
        };
        let gateway = GatewayBootstrap::with_config(config).unwrap();

        gateway
            .client
            .submit_signal(&Signal::buy("sma", "AAPL", dec!(10)))
            .await
            .unwrap();
        gateway.shutdown().await;

        let reopened = tollgate_order_manager::FileJournal::open(&path).unwrap();
        assert_eq!(reopened.replay().unwrap().len(), 2);

        let _ = std::fs::remove_file(&path);
    }
}
