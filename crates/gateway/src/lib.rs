//! Tollgate Gateway
//!
//! RPC surface of the Tollgate execution gateway. Provides:
//! - Transport abstraction (tokio channels, with a trait for future transports)
//! - Wire message types for the execution service
//! - A bincode frame codec for byte-oriented transports
//! - The service dispatcher and a typed client
//!
//! ## Architecture
//!
//! ```text
//! Strategies
//!     │ ExecutionClient
//!     │   SubmitSignal, CancelOrder, ReplaceOrder,
//!     │   GetPosition, GetAllPositions, GetOrderStatus,
//!     │   ActivateKillSwitch
//!┌────▼──────────────┐
//!│ Requester         │  ChannelRequester (mpsc + oneshot, bounded wait)
//!└────┬──────────────┘
//!┌────▼──────────────┐
//!│ ExecutionService  │  one task per request
//!└────┬──────────────┘
//!     │
//!  AdmissionController
//! ```
//!
//! Business rejections travel as normal responses carrying a rejection code;
//! only transport failures surface as errors.

pub mod client;
pub mod codec;
pub mod error;
pub mod messages;
pub mod service;
pub mod transport;

// Re-export commonly used types
pub use client::ExecutionClient;
pub use codec::WireCodec;
pub use error::{GatewayError, TransportError};
pub use messages::execution::{
    AdmissionResponse, CancelResponse, ExecutionRequest, ExecutionResponse, FaultResponse,
    SignalMessage,
};
pub use service::ExecutionService;
pub use transport::{
    Requester,
    channel::{ChannelRequester, ChannelResponder},
};
