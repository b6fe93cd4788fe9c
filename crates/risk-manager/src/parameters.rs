//! Risk Limits
//!
//! The limits the Order Manager checks every admission against.
//! Per-symbol and per-strategy entries override the defaults.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Full set of admission limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Limits for symbols without an override
    pub default_instrument_limits: InstrumentLimits,
    /// Per-symbol limits
    pub instrument_limits: HashMap<String, InstrumentLimits>,
    /// Limits for strategies without an override
    pub default_strategy_limits: StrategyLimits,
    /// Per-strategy limits
    pub strategy_limits: HashMap<String, StrategyLimits>,
}

impl RiskLimits {
    /// Builder: Set limits for a specific symbol
    pub fn with_instrument(mut self, symbol: &str, limits: InstrumentLimits) -> Self {
        self.instrument_limits.insert(symbol.to_string(), limits);
        self
    }

    /// Builder: Set limits for a specific strategy
    pub fn with_strategy(mut self, strategy_id: &str, limits: StrategyLimits) -> Self {
        self.strategy_limits.insert(strategy_id.to_string(), limits);
        self
    }

    /// Effective limits for a symbol
    pub fn instrument(&self, symbol: &str) -> &InstrumentLimits {
        self.instrument_limits
            .get(symbol)
            .unwrap_or(&self.default_instrument_limits)
    }

    /// Effective limits for a strategy
    pub fn strategy(&self, strategy_id: &str) -> &StrategyLimits {
        self.strategy_limits
            .get(strategy_id)
            .unwrap_or(&self.default_strategy_limits)
    }

    /// Get position limit for symbol
    pub fn position_limit(&self, symbol: &str) -> Decimal {
        self.instrument(symbol).max_position
    }

    /// Get max order size for symbol
    pub fn max_order_size(&self, symbol: &str) -> Decimal {
        self.instrument(symbol).max_order_size
    }

    /// Get gross notional limit for strategy
    pub fn notional_limit(&self, strategy_id: &str) -> Decimal {
        self.strategy(strategy_id).max_notional
    }

    /// Check if trading is allowed for a symbol
    pub fn can_trade(&self, symbol: &str) -> bool {
        self.instrument(symbol).enabled
    }
}

/// Limits for a specific symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentLimits {
    /// Maximum position size (absolute)
    pub max_position: Decimal,
    /// Maximum quantity per signal
    pub max_order_size: Decimal,
    /// Is this symbol enabled for trading?
    pub enabled: bool,
}

impl Default for InstrumentLimits {
    fn default() -> Self {
        Self {
            max_position: dec!(1_000),
            max_order_size: dec!(1_000),
            enabled: true,
        }
    }
}

impl InstrumentLimits {
    /// Limits with only the position cap set
    pub fn max_position(max_position: Decimal) -> Self {
        Self {
            max_position,
            max_order_size: max_position,
            ..Default::default()
        }
    }
}

/// Limits for a specific strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyLimits {
    /// Maximum gross notional across all open orders
    pub max_notional: Decimal,
}

impl Default for StrategyLimits {
    fn default() -> Self {
        Self {
            max_notional: dec!(1_000_000),
        }
    }
}
