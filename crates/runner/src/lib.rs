//! Tollgate Runner
//!
//! Process entry point for the execution gateway:
//!
//! - **Config**: JSON file plus environment overrides
//! - **Bootstrap**: Controller, service loop and connected client
//! - **Session**: Scripted demo session driven through the RPC client
//!
//! ## Architecture
//!
//! ```text
//!   TOLLGATE_CONFIG ──► RunnerConfig ──► GatewayBootstrap
//!                                            │
//!            ┌───────────────────────────────┼──────────────────────┐
//!            ▼                               ▼                      ▼
//!     ExecutionClient ──channel──► ExecutionService ──► AdmissionController
//! ```

pub mod bootstrap;
pub mod config;
pub mod session;

// Re-export main types
pub use bootstrap::GatewayBootstrap;
pub use config::{ConfigError, RunnerConfig};
pub use session::{SessionReport, run_demo_session};
