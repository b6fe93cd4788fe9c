//! Tollgate Order Manager
//!
//! The Order Manager sits between strategies and the risk state, responsible for:
//! - **Signal Validation**: Rejects malformed signals before they touch state
//! - **Admission Control**: Accept / reject / cancel / replace against risk limits
//! - **Order Lifecycle**: Mints order ids and enforces status transitions
//! - **Journal**: Append-only audit trail of every decision
//!
//! ## Architecture
//!
//! ```text
//! Strategies ──► Signals ──► ┌────────────────────────────────────────┐
//!                            │          Admission Controller          │
//!                            │  ┌─────────────────────────────────┐   │
//!                            │  │   Kill Switch Gate              │   │
//!                            │  └───────────────┬─────────────────┘   │
//!                            │  ┌───────────────▼─────────────────┐   │
//!                            │  │   Signal Validator              │   │
//!                            │  │   - Non-empty ids, qty > 0      │   │
//!                            │  │   - Confidence in [0, 1]        │   │
//!                            │  └───────────────┬─────────────────┘   │
//!                            │                  │ lock symbol         │
//!                            │  ┌───────────────▼─────────────────┐   │
//!                            │  │   Risk Validator                │   │
//!                            │  │   - Position limits             │   │
//!                            │  │   - Strategy notional limits    │   │
//!                            │  └───────────────┬─────────────────┘   │
//!                            │  ┌───────────────▼─────────────────┐   │
//!                            │  │   Order Lifecycle               │   │
//!                            │  │   - Mint id, PENDING→ACCEPTED   │   │
//!                            │  └───────────────┬─────────────────┘   │
//!                            └──────────────────┼─────────────────────┘
//!                                               │ apply delta
//!                                               ▼
//!                                        Risk State Store
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tollgate_order_manager::{AdmissionConfig, AdmissionController};
//! use tollgate_core::Signal;
//!
//! let controller = AdmissionController::new(AdmissionConfig::default());
//!
//! let order_id = controller
//!     .submit(Signal::buy("sma-cross", "AAPL", dec!(100)).with_confidence(dec!(0.8)))
//!     .await?;
//!
//! controller.cancel("sma-cross", &order_id).await?;
//! ```

pub mod admission;
pub mod error;
pub mod journal;
pub mod lifecycle;
pub mod risk;
pub mod validator;

// Re-export main types
pub use admission::{AdmissionConfig, AdmissionController};
pub use error::{JournalError, Rejection, RejectionCode, Result};
pub use journal::{
    FileJournal, InMemoryJournal, Journal, JournalEntry, JournalEvent, to_json_lines,
};
pub use lifecycle::OrderLifecycle;
pub use risk::{RiskCheckType, RiskSnapshot, RiskValidator, RiskViolation};
pub use validator::{SignalValidator, ValidationError};
