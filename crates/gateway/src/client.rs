//! Typed client for the execution service

use crate::error::GatewayError;
use crate::messages::execution::{
    AdmissionResponse, CancelResponse, ExecutionRequest, ExecutionResponse, SignalMessage,
};
use crate::transport::Requester;
use std::sync::Arc;
use tollgate_core::{KillSwitchState, Order, OrderId, Position, Signal};

/// Strategy-side handle; cheap to clone and share between tasks
#[derive(Clone)]
pub struct ExecutionClient {
    requester: Arc<dyn Requester<ExecutionRequest, ExecutionResponse>>,
}

impl ExecutionClient {
    pub fn new(requester: impl Requester<ExecutionRequest, ExecutionResponse> + 'static) -> Self {
        Self {
            requester: Arc::new(requester),
        }
    }

    async fn call(&self, request: ExecutionRequest) -> Result<ExecutionResponse, GatewayError> {
        match self.requester.request(&request).await? {
            ExecutionResponse::Fault(fault) => Err(GatewayError::Remote {
                code: fault.code,
                message: fault.message,
                retryable: fault.retryable,
            }),
            response => Ok(response),
        }
    }

    pub async fn submit_signal(&self, signal: &Signal) -> Result<AdmissionResponse, GatewayError> {
        self.submit_message(SignalMessage::from(signal)).await
    }

    /// Submit an already-encoded signal (side given as a string)
    pub async fn submit_message(
        &self,
        msg: SignalMessage,
    ) -> Result<AdmissionResponse, GatewayError> {
        match self.call(ExecutionRequest::SubmitSignal(msg)).await? {
            ExecutionResponse::Admission(response) => Ok(response),
            _ => Err(GatewayError::UnexpectedResponse("SubmitSignal")),
        }
    }

    pub async fn cancel_order(
        &self,
        strategy_id: &str,
        order_id: &str,
    ) -> Result<CancelResponse, GatewayError> {
        let request = ExecutionRequest::CancelOrder {
            strategy_id: strategy_id.to_string(),
            order_id: order_id.to_string(),
        };
        match self.call(request).await? {
            ExecutionResponse::Cancel(response) => Ok(response),
            _ => Err(GatewayError::UnexpectedResponse("CancelOrder")),
        }
    }

    pub async fn replace_order(
        &self,
        order_id: &str,
        signal: &Signal,
    ) -> Result<AdmissionResponse, GatewayError> {
        let request = ExecutionRequest::ReplaceOrder {
            order_id: order_id.to_string(),
            signal: SignalMessage::from(signal),
        };
        match self.call(request).await? {
            ExecutionResponse::Admission(response) => Ok(response),
            _ => Err(GatewayError::UnexpectedResponse("ReplaceOrder")),
        }
    }

    pub async fn get_position(&self, symbol: &str) -> Result<Position, GatewayError> {
        let request = ExecutionRequest::GetPosition {
            symbol: symbol.to_string(),
        };
        match self.call(request).await? {
            ExecutionResponse::Position(position) => Ok(position),
            _ => Err(GatewayError::UnexpectedResponse("GetPosition")),
        }
    }

    pub async fn get_all_positions(&self) -> Result<Vec<Position>, GatewayError> {
        match self.call(ExecutionRequest::GetAllPositions).await? {
            ExecutionResponse::Positions(positions) => Ok(positions),
            _ => Err(GatewayError::UnexpectedResponse("GetAllPositions")),
        }
    }

    pub async fn get_order_status(&self, order_id: &OrderId) -> Result<Order, GatewayError> {
        let request = ExecutionRequest::GetOrderStatus {
            order_id: order_id.to_string(),
        };
        match self.call(request).await? {
            ExecutionResponse::OrderStatus(order) => Ok(order),
            _ => Err(GatewayError::UnexpectedResponse("GetOrderStatus")),
        }
    }

    pub async fn activate_kill_switch(
        &self,
        reason: &str,
        initiated_by: &str,
    ) -> Result<KillSwitchState, GatewayError> {
        let request = ExecutionRequest::ActivateKillSwitch {
            reason: reason.to_string(),
            initiated_by: initiated_by.to_string(),
        };
        match self.call(request).await? {
            ExecutionResponse::KillSwitch(state) => Ok(state),
            _ => Err(GatewayError::UnexpectedResponse("ActivateKillSwitch")),
        }
    }
}
