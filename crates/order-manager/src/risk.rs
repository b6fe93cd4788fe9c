//! Risk Validation
//!
//! Checks one admission against the configured limits. This module doesn't
//! track state: the caller reads the position and exposure under their locks
//! and passes them in, so the decision is made against exactly the state the
//! commit will mutate.

use log::warn;
use rust_decimal::Decimal;
use std::fmt;
use tollgate_core::Signal;
use tollgate_risk_manager::RiskLimits;

/// A breached limit
#[derive(Debug, Clone, PartialEq)]
pub struct RiskViolation {
    pub check: RiskCheckType,
    pub message: String,
    pub requested_value: Decimal,
    pub limit_value: Decimal,
}

impl fmt::Display for RiskViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskCheckType {
    TradingDisabled,
    OrderSizeLimit,
    PositionLimit,
    NotionalLimit,
}

impl RiskCheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCheckType::TradingDisabled => "trading disabled",
            RiskCheckType::OrderSizeLimit => "max order size",
            RiskCheckType::PositionLimit => "max position",
            RiskCheckType::NotionalLimit => "max strategy notional",
        }
    }
}

impl fmt::Display for RiskCheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the admission would leave behind if committed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSnapshot {
    /// Symbol quantity the signal's delta is applied on top of
    pub base_quantity: Decimal,
    /// Strategy gross notional before this signal is charged
    pub base_exposure: Decimal,
    /// Notional this signal would charge
    pub notional: Decimal,
}

/// Stateless limit checker
pub struct RiskValidator;

impl RiskValidator {
    /// Validate a signal against the limits, first breach wins
    pub fn check(
        signal: &Signal,
        snapshot: &RiskSnapshot,
        limits: &RiskLimits,
    ) -> Result<(), RiskViolation> {
        let result = Self::evaluate(signal, snapshot, limits);
        if let Err(violation) = &result {
            warn!(
                "[RISK REJECTED] {} {} {} {}: {}",
                signal.strategy_id, signal.side, signal.target_quantity, signal.symbol, violation
            );
        }
        result
    }

    fn evaluate(
        signal: &Signal,
        snapshot: &RiskSnapshot,
        limits: &RiskLimits,
    ) -> Result<(), RiskViolation> {
        let symbol = signal.symbol.as_str();

        // 0. Check if the symbol is enabled
        if !limits.can_trade(symbol) {
            return Err(RiskViolation {
                check: RiskCheckType::TradingDisabled,
                message: format!("trading disabled for {}", symbol),
                requested_value: signal.target_quantity,
                limit_value: Decimal::ZERO,
            });
        }

        // 1. Check order size
        let max_order = limits.max_order_size(symbol);
        if signal.target_quantity > max_order {
            return Err(RiskViolation {
                check: RiskCheckType::OrderSizeLimit,
                message: format!(
                    "quantity {} exceeds limit {} for {}",
                    signal.target_quantity, max_order, symbol
                ),
                requested_value: signal.target_quantity,
                limit_value: max_order,
            });
        }

        // 2. Check position limit on the projected position
        let max_pos = limits.position_limit(symbol);
        let projected = snapshot.base_quantity + signal.signed_quantity();
        if projected.abs() > max_pos {
            return Err(RiskViolation {
                check: RiskCheckType::PositionLimit,
                message: format!(
                    "projected position {} exceeds limit {} for {}",
                    projected, max_pos, symbol
                ),
                requested_value: projected,
                limit_value: max_pos,
            });
        }

        // 3. Check strategy gross notional
        let max_notional = limits.notional_limit(&signal.strategy_id);
        let projected_exposure = snapshot.base_exposure + snapshot.notional;
        if projected_exposure > max_notional {
            return Err(RiskViolation {
                check: RiskCheckType::NotionalLimit,
                message: format!(
                    "notional {} exceeds limit {} for strategy {}",
                    projected_exposure, max_notional, signal.strategy_id
                ),
                requested_value: projected_exposure,
                limit_value: max_notional,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tollgate_risk_manager::{InstrumentLimits, StrategyLimits};

    fn flat(notional: Decimal) -> RiskSnapshot {
        RiskSnapshot {
            base_quantity: Decimal::ZERO,
            base_exposure: Decimal::ZERO,
            notional,
        }
    }

    fn limits() -> RiskLimits {
        RiskLimits::default()
            .with_instrument("AAPL", InstrumentLimits::max_position(dec!(500)))
            .with_strategy(
                "sma",
                StrategyLimits {
                    max_notional: dec!(50_000),
                },
            )
    }

    #[test]
    fn test_within_limits() {
        let signal = Signal::buy("sma", "AAPL", dec!(100));
        assert!(RiskValidator::check(&signal, &flat(dec!(100)), &limits()).is_ok());
    }

    #[test]
    fn test_projected_position_at_limit_passes() {
        let signal = Signal::buy("sma", "AAPL", dec!(400));
        let snapshot = RiskSnapshot {
            base_quantity: dec!(100),
            ..flat(dec!(400))
        };
        assert!(RiskValidator::check(&signal, &snapshot, &limits()).is_ok());
    }

    #[test]
    fn test_position_limit_breach() {
        let signal = Signal::buy("sma", "AAPL", dec!(450));
        let snapshot = RiskSnapshot {
            base_quantity: dec!(100),
            ..flat(dec!(450))
        };

        let violation = RiskValidator::check(&signal, &snapshot, &limits()).unwrap_err();
        assert_eq!(violation.check, RiskCheckType::PositionLimit);
        assert_eq!(violation.requested_value, dec!(550));
        assert_eq!(violation.limit_value, dec!(500));
        assert!(violation.to_string().starts_with("max position"));
    }

    #[test]
    fn test_short_side_is_limited_by_absolute_value() {
        let signal = Signal::sell("sma", "AAPL", dec!(300));
        let snapshot = RiskSnapshot {
            base_quantity: dec!(-300),
            ..flat(dec!(300))
        };

        let violation = RiskValidator::check(&signal, &snapshot, &limits()).unwrap_err();
        assert_eq!(violation.check, RiskCheckType::PositionLimit);

        // Reducing a long is fine even when the order is large
        let reduce = RiskSnapshot {
            base_quantity: dec!(400),
            ..flat(dec!(300))
        };
        assert!(RiskValidator::check(&signal, &reduce, &limits()).is_ok());
    }

    #[test]
    fn test_order_size_limit() {
        let limits = RiskLimits::default().with_instrument(
            "AAPL",
            InstrumentLimits {
                max_order_size: dec!(50),
                ..Default::default()
            },
        );
        let signal = Signal::buy("sma", "AAPL", dec!(51));

        let violation = RiskValidator::check(&signal, &flat(dec!(51)), &limits).unwrap_err();
        assert_eq!(violation.check, RiskCheckType::OrderSizeLimit);
    }

    #[test]
    fn test_disabled_symbol() {
        let limits = RiskLimits::default().with_instrument(
            "GME",
            InstrumentLimits {
                enabled: false,
                ..Default::default()
            },
        );
        let signal = Signal::buy("sma", "GME", dec!(1));

        let violation = RiskValidator::check(&signal, &flat(dec!(1)), &limits).unwrap_err();
        assert_eq!(violation.check, RiskCheckType::TradingDisabled);
    }

    #[test]
    fn test_notional_limit() {
        let signal = Signal::buy("sma", "AAPL", dec!(100)).with_reference_price(dec!(200));
        let snapshot = RiskSnapshot {
            base_quantity: Decimal::ZERO,
            base_exposure: dec!(35_000),
            notional: dec!(20_000),
        };

        let violation = RiskValidator::check(&signal, &snapshot, &limits()).unwrap_err();
        assert_eq!(violation.check, RiskCheckType::NotionalLimit);
        assert_eq!(violation.requested_value, dec!(55_000));
    }
}
