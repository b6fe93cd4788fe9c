//! Tollgate Core Domain
//!
//! Pure domain types for the Tollgate execution gateway.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;

// Re-export commonly used types at crate root
pub use entities::{
    KillSwitchState, Order, OrderId, OrderStatus, ParseOrderIdError, ParseSideError, Position,
    Side, Signal,
};
