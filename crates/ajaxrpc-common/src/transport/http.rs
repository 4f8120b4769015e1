//! HTTP Transport Utilities
//!
//! Conversions between hyper messages and the request/reply envelopes.
//! Every call is a POST whose body is one JSON request envelope; the
//! response is always `200 OK` carrying one JSON reply envelope, so faults
//! travel in the body rather than in the status line.
//!
//! # Example
//!
//! ```
//! use ajaxrpc_common::transport::http::HttpTransport;
//! use ajaxrpc_common::protocol::{Reply, Value};
//! use hyper::body::Bytes;
//!
//! let body = Bytes::from(r#"{"method":"echo","params":[{"int":5}]}"#);
//! let request = HttpTransport::parse_request(&body).unwrap();
//! assert_eq!(request.method, "echo");
//!
//! let response = HttpTransport::to_http_response(&Reply::Result(Value::Int(5)));
//! assert_eq!(response.status(), hyper::StatusCode::OK);
//! ```

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};

use crate::protocol::error::AjaxrpcError;
use crate::protocol::{Fault, FaultCode, Reply, Request as CallRequest};

/// Type alias for Hyper incoming requests
pub type HyperRequest = Request<Incoming>;

/// Type alias for Hyper responses with full body
pub type HyperResponse = Response<Full<Bytes>>;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const JAVASCRIPT_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";

/// HTTP transport utility functions
pub struct HttpTransport;

impl HttpTransport {
    /// Parse a request envelope from an HTTP body
    pub fn parse_request(body: &[u8]) -> Result<CallRequest, AjaxrpcError> {
        serde_json::from_slice(body).map_err(AjaxrpcError::JsonSerialization)
    }

    /// Build the fault reply for a body that is not a request envelope
    pub fn malformed(err: &AjaxrpcError) -> Reply {
        Reply::Fault(Fault::malformed_request(err.to_string()))
    }

    /// Create an HTTP response carrying a reply envelope
    pub fn to_http_response(reply: &Reply) -> HyperResponse {
        let body = serde_json::to_vec(reply).unwrap_or_else(|e| {
            let fallback = Reply::Fault(Fault::new(
                FaultCode::InvalidReply,
                format!("reply could not be encoded: {}", e),
            ));
            serde_json::to_vec(&fallback).unwrap_or_default()
        });
        Self::to_encoded_response(Bytes::from(body))
    }

    /// Create an HTTP response from an already encoded reply envelope
    pub fn to_encoded_response(body: Bytes) -> HyperResponse {
        Self::with_content_type(StatusCode::OK, JSON_CONTENT_TYPE, body)
    }

    /// Create an HTTP response carrying generated script
    pub fn to_script_response(script: impl Into<Bytes>) -> HyperResponse {
        Self::with_content_type(StatusCode::OK, JAVASCRIPT_CONTENT_TYPE, script.into())
    }

    /// Create a plain-text response with a custom status code
    pub fn to_status_response(status: StatusCode, message: &str) -> HyperResponse {
        Self::with_content_type(
            status,
            "text/plain; charset=utf-8",
            Bytes::from(message.to_owned()),
        )
    }

    fn with_content_type(status: StatusCode, content_type: &'static str, body: Bytes) -> HyperResponse {
        let mut response = Response::new(Full::new(body));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }
}
