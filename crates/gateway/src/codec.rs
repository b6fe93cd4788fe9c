//! Binary wire codec
//!
//! Frames are a 4-byte big-endian length followed by a bincode payload.

use crate::error::TransportError;
use serde::{Serialize, de::DeserializeOwned};

const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct WireCodec {
    max_frame_size: usize,
}

impl WireCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Serialize a message into one length-prefixed frame
    pub fn encode<M: Serialize>(&self, msg: &M) -> Result<Vec<u8>, TransportError> {
        let payload =
            bincode::serialize(msg).map_err(|e| TransportError::Serialization(e.to_string()))?;
        if payload.len() > self.max_frame_size {
            return Err(TransportError::FrameTooLarge(payload.len()));
        }

        let len = u32::try_from(payload.len())
            .map_err(|_| TransportError::FrameTooLarge(payload.len()))?;
        let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode the first complete frame in `buf`
    ///
    /// Returns the message and the bytes consumed, or `None` if `buf` does not
    /// hold a full frame yet.
    pub fn decode<M: DeserializeOwned>(
        &self,
        buf: &[u8],
    ) -> Result<Option<(M, usize)>, TransportError> {
        let Some(header) = buf.get(..HEADER_LEN) else {
            return Ok(None);
        };
        let mut len_bytes = [0u8; HEADER_LEN];
        len_bytes.copy_from_slice(header);
        let len = u32::from_be_bytes(len_bytes) as usize;
        if len > self.max_frame_size {
            return Err(TransportError::FrameTooLarge(len));
        }

        let Some(payload) = buf.get(HEADER_LEN..HEADER_LEN + len) else {
            return Ok(None);
        };
        let msg = bincode::deserialize(payload)
            .map_err(|e| TransportError::Deserialization(e.to_string()))?;
        Ok(Some((msg, HEADER_LEN + len)))
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::execution::{ExecutionRequest, SignalMessage};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn submit() -> ExecutionRequest {
        ExecutionRequest::SubmitSignal(SignalMessage {
            strategy_id: "sma".to_string(),
            symbol: "AAPL".to_string(),
            side: "BUY".to_string(),
            target_quantity: dec!(100.5),
            confidence: dec!(0.9),
            generated_at: Utc::now(),
            reference_price: None,
        })
    }

    #[test]
    fn test_frame_carries_request() {
        let codec = WireCodec::default();
        let frame = codec.encode(&submit()).unwrap();

        let (decoded, used): (ExecutionRequest, usize) = codec.decode(&frame).unwrap().unwrap();
        assert_eq!(used, frame.len());
        match decoded {
            ExecutionRequest::SubmitSignal(msg) => {
                assert_eq!(msg.target_quantity, dec!(100.5));
                assert_eq!(msg.side, "BUY");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_partial_frame_waits_for_more() {
        let codec = WireCodec::default();
        let frame = codec.encode(&submit()).unwrap();

        assert!(codec.decode::<ExecutionRequest>(&frame[..2]).unwrap().is_none());
        assert!(
            codec
                .decode::<ExecutionRequest>(&frame[..frame.len() - 1])
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_back_to_back_frames() {
        let codec = WireCodec::default();
        let mut buf = codec.encode(&ExecutionRequest::GetAllPositions).unwrap();
        buf.extend(codec.encode(&submit()).unwrap());

        let (_, used): (ExecutionRequest, usize) = codec.decode(&buf).unwrap().unwrap();
        let (second, _): (ExecutionRequest, usize) = codec.decode(&buf[used..]).unwrap().unwrap();
        assert_eq!(second.method(), "SubmitSignal");
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let codec = WireCodec::new(8);
        let err = codec.encode(&submit()).unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge(_)));
    }
}
