use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
///
/// ```text
/// PENDING ──► ACCEPTED ──► CANCELLED
///    │            └──────► REPLACED
///    └──► REJECTED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order identity minted, admission not yet committed
    Pending,
    /// Admitted; its position delta is applied
    Accepted,
    /// Refused at admission (never addressable by id)
    Rejected,
    /// Cancelled by its strategy; delta reversed
    Cancelled,
    /// Superseded by a replacement order; delta reversed
    Replaced,
}

impl OrderStatus {
    /// Returns true if the order can never change again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Rejected | OrderStatus::Cancelled | OrderStatus::Replaced
        )
    }

    /// Returns true if the order may still be cancelled or replaced
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Accepted)
    }

    /// Whether `self -> next` is an edge of the lifecycle state machine
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (*self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
                | (Accepted, Replaced)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Replaced => "REPLACED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
