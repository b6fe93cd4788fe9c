//! Error types for the gateway crate

use thiserror::Error;
use tollgate_order_manager::RejectionCode;

/// Transport-level errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Timeout waiting for response")]
    Timeout,
}

/// Gateway-level errors (client operations)
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Service fault ({code:?}): {message}")]
    Remote {
        code: RejectionCode,
        message: String,
        retryable: bool,
    },

    #[error("Unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}

impl GatewayError {
    /// Whether resending the same request may succeed
    ///
    /// A timed-out request may still have been decided, so it is not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Remote { retryable: true, .. })
    }
}
