//! Client Transports
//!
//! A [`Transport`] carries one encoded request to the server and returns
//! the encoded reply. [`HttpTransportClient`] does this with an HTTP POST;
//! tests and in-process setups plug in their own implementations.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};
use ajaxrpc_common::transport::http::JSON_CONTENT_TYPE;

/// Moves one encoded request to the server and back.
///
/// Implementations must not interpret the payload. Timeouts are applied by
/// the caller; an implementation may also report its own with
/// [`AjaxrpcError::Timeout`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: Bytes) -> Result<Bytes>;
}

/// HTTP/1.1 transport posting to a fixed endpoint.
///
/// Connections are pooled by the underlying hyper client. Only plain
/// `http://` endpoints are supported; no TLS connector is bundled.
#[derive(Clone)]
pub struct HttpTransportClient {
    endpoint: Uri,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpTransportClient {
    /// Creates a transport for `endpoint`, e.g. `http://127.0.0.1:8080/`.
    ///
    /// # Errors
    ///
    /// `AjaxrpcError::Transport` if the URL does not parse or uses a scheme
    /// other than `http`.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint: Uri = endpoint
            .parse()
            .map_err(|e| AjaxrpcError::Transport(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        match endpoint.scheme_str() {
            Some("http") => {}
            Some("https") => {
                return Err(AjaxrpcError::Transport(
                    "https endpoints need a TLS connector, which this transport does not bundle"
                        .into(),
                ))
            }
            _ => {
                return Err(AjaxrpcError::Transport(format!(
                    "Endpoint '{}' must start with http://",
                    endpoint
                )))
            }
        }

        Ok(Self {
            endpoint,
            client: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransportClient {
    async fn send(&self, payload: Bytes) -> Result<Bytes> {
        debug!(endpoint = %self.endpoint, bytes = payload.len(), "POST");

        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(Full::new(payload))
            .map_err(|e| AjaxrpcError::Transport(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| AjaxrpcError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AjaxrpcError::Transport(format!(
                "Server answered with HTTP {}",
                status
            )));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| AjaxrpcError::Transport(format!("Failed to read response: {}", e)))?
            .to_bytes();

        Ok(body)
    }
}
