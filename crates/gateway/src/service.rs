//! Execution service
//!
//! Dispatches RPC requests to the admission controller. Rejections become
//! structured responses; nothing here turns a business outcome into a
//! transport error.

use crate::codec::WireCodec;
use crate::error::TransportError;
use crate::messages::execution::{
    AdmissionResponse, CancelResponse, ExecutionRequest, ExecutionResponse, FaultResponse,
};
use crate::transport::channel::{ChannelRequester, ChannelResponder};
use log::{debug, info};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tollgate_core::{OrderId, Signal};
use tollgate_order_manager::{AdmissionController, Rejection};

pub struct ExecutionService {
    controller: Arc<AdmissionController>,
    codec: WireCodec,
}

impl ExecutionService {
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self {
            controller,
            codec: WireCodec::default(),
        }
    }

    pub fn controller(&self) -> &Arc<AdmissionController> {
        &self.controller
    }

    /// Start serving on a fresh channel, returning the requester side
    pub fn spawn(
        self,
        capacity: usize,
    ) -> (
        ChannelRequester<ExecutionRequest, ExecutionResponse>,
        JoinHandle<()>,
    ) {
        let (requester, responder) = ChannelRequester::pair(capacity);
        let handle = tokio::spawn(Arc::new(self).run(responder));
        (requester, handle)
    }

    /// Serve until every requester is dropped, one task per request
    pub async fn run(
        self: Arc<Self>,
        mut responder: ChannelResponder<ExecutionRequest, ExecutionResponse>,
    ) {
        info!("[GATEWAY] Execution service started");
        while let Some((request, reply_tx)) = responder.next().await {
            let service = self.clone();
            tokio::spawn(async move {
                let method = request.method();
                let response = service.handle(request).await;
                if reply_tx.send(response).is_err() {
                    debug!("[GATEWAY] {} caller went away before the reply", method);
                }
            });
        }
        info!("[GATEWAY] Execution service stopped");
    }

    /// Decode one request frame, handle it, and encode the reply frame
    pub async fn handle_frame(&self, frame: &[u8]) -> Result<Option<Vec<u8>>, TransportError> {
        let Some((request, _)) = self.codec.decode::<ExecutionRequest>(frame)? else {
            return Ok(None);
        };
        let response = self.handle(request).await;
        self.codec.encode(&response).map(Some)
    }

    pub async fn handle(&self, request: ExecutionRequest) -> ExecutionResponse {
        debug!("[GATEWAY] {}", request.method());
        match request {
            ExecutionRequest::SubmitSignal(msg) => {
                let result = match Signal::try_from(msg) {
                    Ok(signal) => self.controller.submit(signal).await,
                    Err(e) => Err(Rejection::from(e)),
                };
                ExecutionResponse::Admission(match result {
                    Ok(order_id) => AdmissionResponse::accepted(order_id),
                    Err(rejection) => AdmissionResponse::rejected(&rejection),
                })
            }

            ExecutionRequest::CancelOrder {
                strategy_id,
                order_id,
            } => {
                let result = match parse_order_id(&order_id) {
                    Ok(id) => self.controller.cancel(&strategy_id, &id).await,
                    Err(rejection) => Err(rejection),
                };
                ExecutionResponse::Cancel(match result {
                    Ok(_) => CancelResponse::accepted(),
                    Err(rejection) => CancelResponse::rejected(&rejection),
                })
            }

            ExecutionRequest::ReplaceOrder { order_id, signal } => {
                let result = match (parse_order_id(&order_id), Signal::try_from(signal)) {
                    (Err(rejection), _) => Err(rejection),
                    (_, Err(e)) => Err(Rejection::from(e)),
                    (Ok(id), Ok(signal)) => self.controller.replace(&id, signal).await,
                };
                ExecutionResponse::Admission(match result {
                    Ok(order) => AdmissionResponse::accepted(order.id),
                    Err(rejection) => AdmissionResponse::rejected(&rejection),
                })
            }

            ExecutionRequest::GetPosition { symbol } => {
                match self.controller.position(&symbol).await {
                    Ok(position) => ExecutionResponse::Position(position),
                    Err(rejection) => fault(&rejection),
                }
            }

            ExecutionRequest::GetAllPositions => match self.controller.all_positions().await {
                Ok(positions) => ExecutionResponse::Positions(positions),
                Err(rejection) => fault(&rejection),
            },

            ExecutionRequest::GetOrderStatus { order_id } => {
                match parse_order_id(&order_id).and_then(|id| {
                    self.controller
                        .order(&id)
                        .ok_or_else(|| Rejection::OrderNotFound(order_id.clone()))
                }) {
                    Ok(order) => ExecutionResponse::OrderStatus(order),
                    Err(rejection) => fault(&rejection),
                }
            }

            ExecutionRequest::ActivateKillSwitch {
                reason,
                initiated_by,
            } => ExecutionResponse::KillSwitch(
                self.controller
                    .activate_kill_switch(&reason, &initiated_by)
                    .await,
            ),
        }
    }
}

/// A malformed id can't name an existing order
fn parse_order_id(raw: &str) -> Result<OrderId, Rejection> {
    raw.parse()
        .map_err(|_| Rejection::OrderNotFound(raw.to_string()))
}

fn fault(rejection: &Rejection) -> ExecutionResponse {
    ExecutionResponse::Fault(FaultResponse::from(rejection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::execution::SignalMessage;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tollgate_order_manager::{AdmissionConfig, RejectionCode};

    fn service() -> ExecutionService {
        ExecutionService::new(Arc::new(AdmissionController::new(
            AdmissionConfig::default(),
        )))
    }

    fn buy(quantity: rust_decimal::Decimal) -> SignalMessage {
        SignalMessage {
            strategy_id: "sma".to_string(),
            symbol: "AAPL".to_string(),
            side: "BUY".to_string(),
            target_quantity: quantity,
            confidence: dec!(1),
            generated_at: Utc::now(),
            reference_price: None,
        }
    }

    #[tokio::test]
    async fn test_submit_then_status() {
        let service = service();

        let order_id = match service.handle(ExecutionRequest::SubmitSignal(buy(dec!(10)))).await {
            ExecutionResponse::Admission(r) if r.accepted => r.order_id.unwrap(),
            other => panic!("unexpected {other:?}"),
        };

        match service
            .handle(ExecutionRequest::GetOrderStatus { order_id })
            .await
        {
            ExecutionResponse::OrderStatus(order) => {
                assert_eq!(order.signal.target_quantity, dec!(10));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_side_is_a_structured_rejection() {
        let service = service();
        let mut msg = buy(dec!(10));
        msg.side = "SHORT".to_string();

        match service.handle(ExecutionRequest::SubmitSignal(msg)).await {
            ExecutionResponse::Admission(r) => {
                assert!(!r.accepted);
                assert_eq!(r.rejection_code, Some(RejectionCode::ValidationError));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_order_id_is_not_found() {
        let service = service();

        match service
            .handle(ExecutionRequest::CancelOrder {
                strategy_id: "sma".to_string(),
                order_id: "not-a-uuid".to_string(),
            })
            .await
        {
            ExecutionResponse::Cancel(r) => {
                assert_eq!(r.rejection_code, Some(RejectionCode::OrderNotFound));
            }
            other => panic!("unexpected {other:?}"),
        }

        match service
            .handle(ExecutionRequest::GetOrderStatus {
                order_id: OrderId::new().to_string(),
            })
            .await
        {
            ExecutionResponse::Fault(f) => assert_eq!(f.code, RejectionCode::OrderNotFound),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_frame_round_trip_through_service() {
        let service = service();
        let codec = WireCodec::default();

        let request = codec
            .encode(&ExecutionRequest::SubmitSignal(buy(dec!(5))))
            .unwrap();
        let reply = service.handle_frame(&request).await.unwrap().unwrap();

        let (response, _): (ExecutionResponse, usize) = codec.decode(&reply).unwrap().unwrap();
        assert!(matches!(response, ExecutionResponse::Admission(r) if r.accepted));
        assert!(service.handle_frame(&request[..3]).await.unwrap().is_none());
    }
}
