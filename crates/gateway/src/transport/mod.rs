//! Transport abstraction layer
//!
//! Request/reply over tokio channels. The trait allows swapping in a
//! networked transport (paired with [`crate::codec::WireCodec`]) later.

pub mod channel;

use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// Request/Reply pattern for synchronous-style operations (e.g., signal submission)
#[async_trait]
pub trait Requester<Req, Res>: Send + Sync
where
    Req: Serialize + Send + Sync,
    Res: DeserializeOwned + Send,
{
    /// Send a request and wait for a response
    async fn request(&self, req: &Req) -> Result<Res, TransportError>;
}
