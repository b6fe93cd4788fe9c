//! Signal Validation
//!
//! Shape checks that need no state. A signal that fails here never reaches
//! the risk store.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tollgate_core::{ParseSideError, Signal};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("strategy_id is empty")]
    EmptyStrategyId,

    #[error("symbol is empty")]
    EmptySymbol,

    #[error(transparent)]
    UnknownSide(#[from] ParseSideError),

    #[error("target_quantity must be positive, got {0}")]
    NonPositiveQuantity(String),

    #[error("confidence must be within [0, 1], got {0}")]
    ConfidenceOutOfRange(String),

    #[error("generated_at {generated_at} is ahead of server time {now}")]
    GeneratedInFuture {
        generated_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("reference_price must be positive, got {0}")]
    NonPositiveReferencePrice(String),
}

/// Stateless signal validator
#[derive(Debug, Clone)]
pub struct SignalValidator {
    /// How far ahead of server time generated_at may be
    max_clock_skew: Duration,
}

impl SignalValidator {
    pub fn new(max_clock_skew: Duration) -> Self {
        Self { max_clock_skew }
    }

    pub fn max_clock_skew(&self) -> Duration {
        self.max_clock_skew
    }

    /// Check a signal's shape against server time `now`
    pub fn validate(&self, signal: &Signal, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if signal.strategy_id.trim().is_empty() {
            return Err(ValidationError::EmptyStrategyId);
        }
        if signal.symbol.trim().is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        if signal.target_quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(
                signal.target_quantity.to_string(),
            ));
        }
        if signal.confidence < Decimal::ZERO || signal.confidence > Decimal::ONE {
            return Err(ValidationError::ConfidenceOutOfRange(
                signal.confidence.to_string(),
            ));
        }
        if signal.generated_at > now + self.max_clock_skew {
            return Err(ValidationError::GeneratedInFuture {
                generated_at: signal.generated_at,
                now,
            });
        }
        if let Some(price) = signal.reference_price {
            if price <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveReferencePrice(price.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for SignalValidator {
    fn default() -> Self {
        Self::new(Duration::seconds(5))
    }
}
