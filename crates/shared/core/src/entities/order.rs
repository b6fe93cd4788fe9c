use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::{OrderStatus, Signal};

/// Server-assigned order identifier (random v4 UUID, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

/// Returned when a wire string is not a valid order id
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed order id '{0}'")]
pub struct ParseOrderIdError(pub String);

impl OrderId {
    /// Mint a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for OrderId {
    type Err = ParseOrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(OrderId)
            .map_err(|_| ParseOrderIdError(s.to_string()))
    }
}

/// Full order details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// The signal this order was admitted from
    pub signal: Signal,
    pub status: OrderStatus,
    /// Acceptance order among all orders, assigned on admission
    pub sequence: u64,
    /// Price the position delta was booked at (None = quantity-only booking)
    pub applied_price: Option<Decimal>,
    /// Exposure charged to the originating strategy
    pub notional: Decimal,
    /// Order this one replaced, if any
    pub replaces: Option<OrderId>,
    /// Order that replaced this one, if any
    pub replaced_by: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending order with explicit timestamp
    pub fn new_with_time(
        signal: Signal,
        applied_price: Option<Decimal>,
        notional: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            signal,
            status: OrderStatus::Pending,
            sequence: 0,
            applied_price,
            notional,
            replaces: None,
            replaced_by: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Get the symbol as a string slice
    pub fn symbol(&self) -> &str {
        &self.signal.symbol
    }

    pub fn strategy_id(&self) -> &str {
        &self.signal.strategy_id
    }

    /// Signed position change booked when this order was accepted
    pub fn position_delta(&self) -> Decimal {
        self.signal.signed_quantity()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_ids_are_unique() {
        let a = OrderId::new();
        let b = OrderId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_order_id_round_trips_through_string() {
        let id = OrderId::new();
        let parsed: OrderId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-an-id".parse::<OrderId>().is_err());
    }

    #[test]
    fn test_new_order_is_pending() {
        let now = Utc::now();
        let order = Order::new_with_time(
            Signal::sell("s1", "MSFT", dec!(20)),
            Some(dec!(400)),
            dec!(8000),
            now,
        );

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.position_delta(), dec!(-20));
        assert_eq!(order.symbol(), "MSFT");
        assert_eq!(order.created_at, order.updated_at);
    }
}
