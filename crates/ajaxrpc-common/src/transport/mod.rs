//! AjaxRPC Transport Layer
//!
//! Encoding of envelopes and the HTTP glue shared by client and server.
//!
//! # Components
//!
//! - **[`JsonCodec`]**: Encode/decode request and reply envelopes with a
//!   payload size limit
//! - **[`HttpTransport`]**: Conversions between hyper messages and envelopes

pub mod codec;
pub mod http;

pub use codec::{JsonCodec, DEFAULT_MAX_PAYLOAD_BYTES};
pub use http::{HttpTransport, HyperRequest, HyperResponse};

#[cfg(test)]
mod tests;
