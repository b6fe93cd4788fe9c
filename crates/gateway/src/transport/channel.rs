//! Tokio channel-based transport for single-process mode
//!
//! Requests travel over a bounded mpsc queue, each carrying a oneshot for its
//! reply. No serialization overhead - messages are passed directly.

use crate::error::TransportError;
use crate::transport::Requester;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Request message wrapper for channel-based request/reply
struct ChannelRequest<Req, Res> {
    request: Req,
    reply_tx: oneshot::Sender<Res>,
}

/// Channel-based requester for request/reply pattern
pub struct ChannelRequester<Req, Res> {
    tx: mpsc::Sender<ChannelRequest<Req, Res>>,
    /// Upper bound on the wait for a reply (None = wait forever)
    timeout: Option<Duration>,
}

impl<Req, Res> Clone for ChannelRequester<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            timeout: self.timeout,
        }
    }
}

impl<Req, Res> ChannelRequester<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Create a requester/responder pair
    pub fn pair(capacity: usize) -> (Self, ChannelResponder<Req, Res>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, timeout: None }, ChannelResponder { rx })
    }

    /// Builder: Bound the wait for each reply
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl<Req, Res> Requester<Req, Res> for ChannelRequester<Req, Res>
where
    Req: Serialize + Clone + Send + Sync + 'static,
    Res: DeserializeOwned + Send + 'static,
{
    async fn request(&self, req: &Req) -> Result<Res, TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = ChannelRequest {
            request: req.clone(),
            reply_tx,
        };

        let exchange = async {
            self.tx
                .send(request)
                .await
                .map_err(|_| TransportError::ChannelClosed)?;
            let reply = reply_rx.await.map_err(|_| TransportError::ChannelClosed)?;
            Ok::<_, TransportError>(reply)
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => exchange.await,
        }
    }
}

/// Channel-based responder (server side of request/reply)
pub struct ChannelResponder<Req, Res> {
    rx: mpsc::Receiver<ChannelRequest<Req, Res>>,
}

impl<Req, Res> ChannelResponder<Req, Res> {
    /// Receive the next request; None once every requester is dropped
    pub async fn next(&mut self) -> Option<(Req, oneshot::Sender<Res>)> {
        self.rx.recv().await.map(|req| (req.request, req.reply_tx))
    }
}
