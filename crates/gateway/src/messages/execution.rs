//! Execution service message types
//!
//! Every field is always serialized so the structs stay bincode-safe.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tollgate_core::{KillSwitchState, Order, OrderId, Position, Side, Signal};
use tollgate_order_manager::{Rejection, RejectionCode, ValidationError};

/// Signal as it travels on the wire; side is the string `BUY` or `SELL`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMessage {
    pub strategy_id: String,
    pub symbol: String,
    pub side: String,
    pub target_quantity: Decimal,
    pub confidence: Decimal,
    /// RFC 3339, UTC
    pub generated_at: DateTime<Utc>,
    pub reference_price: Option<Decimal>,
}

impl TryFrom<SignalMessage> for Signal {
    type Error = ValidationError;

    fn try_from(msg: SignalMessage) -> Result<Self, Self::Error> {
        let side: Side = msg.side.parse()?;
        let signal = Signal::new(msg.strategy_id, msg.symbol, side, msg.target_quantity)
            .with_confidence(msg.confidence)
            .with_generated_at(msg.generated_at);
        Ok(match msg.reference_price {
            Some(price) => signal.with_reference_price(price),
            None => signal,
        })
    }
}

impl From<&Signal> for SignalMessage {
    fn from(signal: &Signal) -> Self {
        Self {
            strategy_id: signal.strategy_id.clone(),
            symbol: signal.symbol.clone(),
            side: signal.side.as_str().to_string(),
            target_quantity: signal.target_quantity,
            confidence: signal.confidence,
            generated_at: signal.generated_at,
            reference_price: signal.reference_price,
        }
    }
}

/// Requests understood by the execution service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionRequest {
    SubmitSignal(SignalMessage),
    CancelOrder {
        strategy_id: String,
        order_id: String,
    },
    ReplaceOrder {
        order_id: String,
        signal: SignalMessage,
    },
    GetPosition {
        symbol: String,
    },
    GetAllPositions,
    GetOrderStatus {
        order_id: String,
    },
    ActivateKillSwitch {
        reason: String,
        initiated_by: String,
    },
}

impl ExecutionRequest {
    /// RPC method name, for logs
    pub fn method(&self) -> &'static str {
        match self {
            ExecutionRequest::SubmitSignal(_) => "SubmitSignal",
            ExecutionRequest::CancelOrder { .. } => "CancelOrder",
            ExecutionRequest::ReplaceOrder { .. } => "ReplaceOrder",
            ExecutionRequest::GetPosition { .. } => "GetPosition",
            ExecutionRequest::GetAllPositions => "GetAllPositions",
            ExecutionRequest::GetOrderStatus { .. } => "GetOrderStatus",
            ExecutionRequest::ActivateKillSwitch { .. } => "ActivateKillSwitch",
        }
    }
}

/// Responses from the execution service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionResponse {
    /// Reply to SubmitSignal and ReplaceOrder
    Admission(AdmissionResponse),
    Cancel(CancelResponse),
    Position(Position),
    Positions(Vec<Position>),
    OrderStatus(Order),
    KillSwitch(KillSwitchState),
    /// A query could not be answered
    Fault(FaultResponse),
}

/// Outcome of a submit or replace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub accepted: bool,
    pub order_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<RejectionCode>,
    pub retryable: bool,
}

impl AdmissionResponse {
    pub fn accepted(order_id: OrderId) -> Self {
        Self {
            accepted: true,
            order_id: Some(order_id.to_string()),
            rejection_reason: None,
            rejection_code: None,
            retryable: false,
        }
    }

    pub fn rejected(rejection: &Rejection) -> Self {
        Self {
            accepted: false,
            order_id: None,
            rejection_reason: Some(rejection.to_string()),
            rejection_code: Some(rejection.code()),
            retryable: rejection.is_retryable(),
        }
    }
}

/// Outcome of a cancel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelResponse {
    pub accepted: bool,
    pub rejection_reason: Option<String>,
    pub rejection_code: Option<RejectionCode>,
    pub retryable: bool,
}

impl CancelResponse {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            rejection_reason: None,
            rejection_code: None,
            retryable: false,
        }
    }

    pub fn rejected(rejection: &Rejection) -> Self {
        Self {
            accepted: false,
            rejection_reason: Some(rejection.to_string()),
            rejection_code: Some(rejection.code()),
            retryable: rejection.is_retryable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultResponse {
    pub code: RejectionCode,
    pub message: String,
    pub retryable: bool,
}

impl From<&Rejection> for FaultResponse {
    fn from(rejection: &Rejection) -> Self {
        Self {
            code: rejection.code(),
            message: rejection.to_string(),
            retryable: rejection.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn message(side: &str) -> SignalMessage {
        SignalMessage {
            strategy_id: "sma".to_string(),
            symbol: "AAPL".to_string(),
            side: side.to_string(),
            target_quantity: dec!(100),
            confidence: dec!(0.7),
            generated_at: Utc::now(),
            reference_price: Some(dec!(190)),
        }
    }

    #[test]
    fn test_message_to_signal() {
        let signal = Signal::try_from(message("sell")).unwrap();
        assert_eq!(signal.side, Side::Sell);
        assert_eq!(signal.confidence, dec!(0.7));
        assert_eq!(signal.reference_price, Some(dec!(190)));

        let back = SignalMessage::from(&signal);
        assert_eq!(back.side, "SELL");
    }

    #[test]
    fn test_unknown_side_is_validation_error() {
        let err = Signal::try_from(message("HOLD")).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownSide(_)));
    }

    #[test]
    fn test_rejected_response_carries_code() {
        let rejection = Rejection::OrderNotFound("x".to_string());
        let response = CancelResponse::rejected(&rejection);

        assert!(!response.accepted);
        assert_eq!(response.rejection_code, Some(RejectionCode::OrderNotFound));
        assert!(!response.retryable);
    }
}
