//! Signal - What strategies send to the gateway
//!
//! Strategies don't place orders directly. They send signals naming a side and
//! a quantity; the gateway decides whether to admit them and, if so, turns them
//! into orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// Signal from a strategy
///
/// Immutable once built: every field is set through the constructor and the
/// builder methods, which consume `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Which strategy generated this signal
    pub strategy_id: String,
    /// Instrument to trade
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Quantity to trade, always positive; the sign comes from `side`
    pub target_quantity: Decimal,
    /// Confidence in the signal (0.0 - 1.0)
    pub confidence: Decimal,
    /// When the signal was generated
    pub generated_at: DateTime<Utc>,
    /// Optional: price the strategy expects to trade at
    /// Used for average price bookkeeping and notional exposure
    #[serde(default)]
    pub reference_price: Option<Decimal>,
}

impl Signal {
    /// Create a new signal with full confidence, stamped now
    pub fn new(
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        target_quantity: Decimal,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            side,
            target_quantity,
            confidence: Decimal::ONE,
            generated_at: Utc::now(),
            reference_price: None,
        }
    }

    /// Shorthand for a buy signal
    pub fn buy(
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self::new(strategy_id, symbol, Side::Buy, quantity)
    }

    /// Shorthand for a sell signal
    pub fn sell(
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self::new(strategy_id, symbol, Side::Sell, quantity)
    }

    /// Builder: Set confidence
    ///
    /// Not clamped: out-of-range values are for the validator to reject.
    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = confidence;
        self
    }

    /// Builder: Set generation time
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Builder: Set reference price
    pub fn with_reference_price(mut self, price: Decimal) -> Self {
        self.reference_price = Some(price);
        self
    }

    /// Position change this signal asks for: +qty for buys, -qty for sells
    pub fn signed_quantity(&self) -> Decimal {
        self.side.sign() * self.target_quantity
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signal_creation() {
        let signal = Signal::buy("sma-cross", "AAPL", dec!(100))
            .with_confidence(dec!(0.85))
            .with_reference_price(dec!(190.5));

        assert_eq!(signal.strategy_id, "sma-cross");
        assert_eq!(signal.symbol, "AAPL");
        assert_eq!(signal.target_quantity, dec!(100));
        assert_eq!(signal.confidence, dec!(0.85));
        assert_eq!(signal.reference_price, Some(dec!(190.5)));
        assert!(signal.is_buy());
    }

    #[test]
    fn test_signed_quantity() {
        assert_eq!(
            Signal::buy("s", "AAPL", dec!(1.5)).signed_quantity(),
            dec!(1.5)
        );
        assert_eq!(
            Signal::sell("s", "AAPL", dec!(1.5)).signed_quantity(),
            dec!(-1.5)
        );
    }

    #[test]
    fn test_confidence_not_clamped() {
        let signal = Signal::buy("s", "AAPL", dec!(1)).with_confidence(dec!(1.5));
        assert_eq!(signal.confidence, dec!(1.5));
    }
}
