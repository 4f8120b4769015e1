use bytes::Bytes;

use crate::protocol::error::{AjaxrpcError, Result};
use crate::protocol::{Reply, Request};

/// Default upper bound for an encoded request or reply (10 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// JSON codec for the request and reply envelopes
///
/// Incoming payloads larger than the configured limit are rejected before
/// parsing. Encoding is never size-checked, so a fault about an oversized
/// request always reaches the caller intact. Nesting depth is additionally bounded by `serde_json`'s recursion limit
/// of 128 levels.
///
/// # Example
///
/// ```
/// use ajaxrpc_common::transport::JsonCodec;
/// use ajaxrpc_common::protocol::{Reply, Request, Value};
///
/// let codec = JsonCodec::default();
///
/// let request = Request::new("sumintegers", (vec![10i64, 11, 12],));
/// let encoded = codec.encode_request(&request).unwrap();
/// assert_eq!(codec.decode_request(&encoded).unwrap(), request);
///
/// let reply = Reply::Result(Value::Int(33));
/// let encoded = codec.encode_reply(&reply).unwrap();
/// assert_eq!(codec.decode_reply(&encoded).unwrap(), reply);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    max_payload_bytes: usize,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl JsonCodec {
    pub fn with_max_payload_bytes(max_payload_bytes: usize) -> Self {
        Self { max_payload_bytes }
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Encode a request to bytes
    ///
    /// # Errors
    ///
    /// `JsonSerialization` if a parameter cannot be written, e.g. a
    /// non-finite double.
    pub fn encode_request(&self, request: &Request) -> Result<Bytes> {
        self.encode(request)
    }

    /// Decode a request from bytes
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the payload exceeds the limit,
    /// `JsonSerialization` if it is not a valid request envelope.
    pub fn decode_request(&self, data: &[u8]) -> Result<Request> {
        self.check_size(data)?;
        Ok(serde_json::from_slice(data)?)
    }

    /// Encode a reply to bytes
    pub fn encode_reply(&self, reply: &Reply) -> Result<Bytes> {
        self.encode(reply)
    }

    /// Decode a reply from bytes
    pub fn decode_reply(&self, data: &[u8]) -> Result<Reply> {
        self.check_size(data)?;
        Ok(serde_json::from_slice(data)?)
    }

    fn encode<T: serde::Serialize>(&self, message: &T) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(message)?))
    }

    fn check_size(&self, data: &[u8]) -> Result<()> {
        if data.len() > self.max_payload_bytes {
            return Err(AjaxrpcError::InvalidRequest(format!(
                "payload of {} bytes exceeds the {} byte limit",
                data.len(),
                self.max_payload_bytes
            )));
        }
        Ok(())
    }
}
