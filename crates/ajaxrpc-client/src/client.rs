use std::sync::Arc;

use tracing::{debug, warn};

use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};
use ajaxrpc_common::transport::JsonCodec;
use ajaxrpc_common::{Fault, FaultCode, FromValue, IntoParams, Request, Signature, Value};

use crate::config::ClientConfig;
use crate::transport::{HttpTransportClient, Transport};

/// AjaxRPC client for making calls
///
/// Cheap to clone; clones share the transport. Every failure reaches the
/// caller as a [`Fault`]:
///
/// | failure | fault |
/// |---|---|
/// | argument JSON cannot carry (NaN, infinity) | `TypeMismatch` |
/// | no reply within `call_timeout` | `TransportTimeout` |
/// | transport error | `TransportFailure` |
/// | reply is not a reply envelope | `InvalidReply` |
/// | server fault | passed through unchanged |
#[derive(Clone)]
pub struct AjaxrpcClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    codec: JsonCodec,
}

impl std::fmt::Debug for AjaxrpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AjaxrpcClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AjaxrpcClient {
    /// Create a client posting to an HTTP endpoint
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self::from_transport(Arc::new(HttpTransportClient::new(endpoint)?)))
    }

    /// Create a client over any transport, with the default configuration
    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
            codec: JsonCodec::default(),
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call a method and return its raw result value
    pub async fn call(&self, method: &str, params: impl IntoParams) -> std::result::Result<Value, Fault> {
        let request = Request::new(method, params);
        // Encoding only fails for values JSON cannot carry.
        let payload = self.codec.encode_request(&request).map_err(|e| {
            Fault::new(
                FaultCode::TypeMismatch,
                format!("arguments to '{}' cannot be sent: {}", method, e),
            )
        })?;

        debug!(method, params = request.params.len(), "sending call");

        let timeout = self.config.call_timeout;
        let reply_bytes = match tokio::time::timeout(timeout, self.transport.send(payload)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(AjaxrpcError::Timeout(ms))) => {
                warn!(method, ms, "transport timed out");
                return Err(Fault::new(
                    FaultCode::TransportTimeout,
                    format!("no reply to '{}' within {} ms", method, ms),
                ));
            }
            Ok(Err(e)) => {
                warn!(method, error = %e, "transport failed");
                return Err(Fault::new(FaultCode::TransportFailure, e.to_string()));
            }
            Err(_) => {
                let ms = timeout.as_millis() as u64;
                warn!(method, ms, "call timed out");
                return Err(Fault::new(
                    FaultCode::TransportTimeout,
                    format!("no reply to '{}' within {} ms", method, ms),
                ));
            }
        };

        let reply = self.codec.decode_reply(&reply_bytes).map_err(|e| {
            warn!(method, error = %e, "undecodable reply");
            Fault::new(
                FaultCode::InvalidReply,
                format!("reply to '{}' is not a valid envelope: {}", method, e),
            )
        })?;

        reply.into_result()
    }

    /// Call a method and decode its result
    pub async fn call_as<R: FromValue>(
        &self,
        method: &str,
        params: impl IntoParams,
    ) -> std::result::Result<R, Fault> {
        let value = self.call(method, params).await?;
        R::from_value(&value).map_err(Fault::from)
    }

    /// `system.listMethods`
    pub async fn list_methods(&self) -> std::result::Result<Vec<String>, Fault> {
        self.call_as("system.listMethods", ()).await
    }

    /// `system.methodSignature`, parsed back into signatures
    pub async fn method_signatures(&self, name: &str) -> std::result::Result<Vec<Signature>, Fault> {
        let raw: Vec<Vec<String>> = self.call_as("system.methodSignature", (name,)).await?;
        raw.iter()
            .map(|names| {
                Signature::from_names(names.as_slice()).map_err(|e| {
                    Fault::new(
                        FaultCode::InvalidReply,
                        format!("bad signature for '{}': {}", name, e),
                    )
                })
            })
            .collect()
    }

    /// `system.methodHelp`
    pub async fn method_help(&self, name: &str) -> std::result::Result<String, Fault> {
        self.call_as("system.methodHelp", (name,)).await
    }
}
