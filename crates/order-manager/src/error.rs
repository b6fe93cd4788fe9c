//! Order Manager errors
//!
//! Every way an admission, cancel or replace can be refused. These are
//! business outcomes, returned to the caller as structured rejections.

use crate::risk::RiskViolation;
use crate::validator::ValidationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tollgate_core::{OrderId, OrderStatus};
use tollgate_risk_manager::StoreError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("invalid signal: {0}")]
    Validation(#[from] ValidationError),

    #[error("risk limit exceeded: {0}")]
    RiskLimitExceeded(RiskViolation),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("order {order_id} is {from}, not cancellable (requested {to})")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("kill switch active: {reason}")]
    KillSwitchActive { reason: String },

    #[error("risk state unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

/// Machine-readable rejection category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionCode {
    ValidationError,
    RiskLimitExceeded,
    OrderNotFound,
    InvalidTransition,
    KillSwitchActive,
    Unavailable,
}

impl Rejection {
    pub fn code(&self) -> RejectionCode {
        match self {
            Rejection::Validation(_) => RejectionCode::ValidationError,
            Rejection::RiskLimitExceeded(_) => RejectionCode::RiskLimitExceeded,
            Rejection::OrderNotFound(_) => RejectionCode::OrderNotFound,
            Rejection::InvalidTransition { .. } => RejectionCode::InvalidTransition,
            Rejection::KillSwitchActive { .. } => RejectionCode::KillSwitchActive,
            Rejection::Unavailable(_) => RejectionCode::Unavailable,
        }
    }

    /// Whether resending the same request may succeed
    ///
    /// Only a fail-closed timeout qualifies: it committed nothing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Rejection::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Rejection>;

/// Failure to open or read a journal file
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("journal {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl JournalError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        JournalError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
