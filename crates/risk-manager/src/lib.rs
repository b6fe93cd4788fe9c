//! Tollgate Risk Manager
//!
//! Authoritative risk state for the execution gateway:
//!
//! - **Positions**: one record per symbol, each behind its own lock
//! - **Strategy Exposure**: gross notional charged per strategy
//! - **Kill Switch**: process-wide stop that gates every admission
//! - **Risk Limits**: per-symbol and per-strategy limits consumed by the Order Manager
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RiskStateStore                          │
//! │                                                             │
//! │  "AAPL" ──► Mutex<Position>     strategy ──► exposure       │
//! │  "MSFT" ──► Mutex<Position>     strategy ──► exposure       │
//! │   ...                                                       │
//! │                                                             │
//! │  RwLock<KillSwitchState>  (read = admission, write = stop)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//!                              │ lock symbol, check, apply
//!                              │
//!                       Order Manager
//! ```
//!
//! Every lock wait is bounded. A wait that runs out becomes
//! [`StoreError::Unavailable`] so callers fail closed.

pub mod error;
pub mod parameters;
pub mod store;

// Re-export main types
pub use error::{Result, StoreError};
pub use parameters::{InstrumentLimits, RiskLimits, StrategyLimits};
pub use store::{AdmissionGate, RiskStateStore, StrategyGuard, SymbolGuard};
