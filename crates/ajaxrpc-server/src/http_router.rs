//! HTTP Router for AjaxRPC
//!
//! Maps HTTP requests onto the dispatcher:
//!
//! - `GET /stubs.js`: the rendered JavaScript stubs
//! - `POST` to any other path: one request envelope in, one reply envelope
//!   out, always with status 200
//! - anything else: `404 Not Found` or `405 Method Not Allowed`

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{Method, StatusCode};
use tracing::{debug, error, warn};

use ajaxrpc_common::protocol::error::AjaxrpcError;
use ajaxrpc_common::transport::{HttpTransport, HyperRequest, HyperResponse};
use ajaxrpc_common::{Fault, Reply};

use crate::dispatcher::Dispatcher;
use crate::js_stubs::STUBS_PATH;
use crate::limits::ServerLimits;

/// HTTP router in front of a [`Dispatcher`].
pub struct AjaxrpcRouter {
    dispatcher: Arc<Dispatcher>,
    limits: ServerLimits,
    stubs: Bytes,
}

impl AjaxrpcRouter {
    /// Creates a router serving `stubs` as the stub script.
    pub fn new(dispatcher: Arc<Dispatcher>, limits: ServerLimits, stubs: impl Into<Bytes>) -> Self {
        Self {
            dispatcher,
            limits,
            stubs: stubs.into(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Handles one HTTP request.
    pub async fn handle(&self, req: HyperRequest) -> Result<HyperResponse, Infallible> {
        let path = req.uri().path().to_owned();
        let response = match (req.method(), path.as_str()) {
            (&Method::GET, STUBS_PATH) => HttpTransport::to_script_response(self.stubs.clone()),
            (&Method::POST, STUBS_PATH) => HttpTransport::to_status_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "the stub script is read-only",
            ),
            (&Method::POST, _) => self.handle_call(req).await,
            (&Method::GET, _) => HttpTransport::to_status_response(StatusCode::NOT_FOUND, "not found"),
            _ => HttpTransport::to_status_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "use POST for calls and GET for the stub script",
            ),
        };
        Ok(response)
    }

    async fn handle_call(&self, req: HyperRequest) -> HyperResponse {
        let body = match Limited::new(req.into_body(), self.limits.max_body_bytes)
            .collect()
            .await
        {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                warn!("rejecting request body over {} bytes", self.limits.max_body_bytes);
                let err = AjaxrpcError::InvalidRequest(format!(
                    "request body exceeds {} bytes",
                    self.limits.max_body_bytes
                ));
                return HttpTransport::to_http_response(&HttpTransport::malformed(&err));
            }
            Err(e) => {
                error!("Failed to read request body: {}", e);
                return HttpTransport::to_status_response(
                    StatusCode::BAD_REQUEST,
                    "failed to read request body",
                );
            }
        };
        debug!(bytes = body.len(), "dispatching request");

        let dispatcher = Arc::clone(&self.dispatcher);
        let task = tokio::task::spawn_blocking(move || dispatcher.dispatch_bytes(&body));

        match tokio::time::timeout(self.limits.dispatch_timeout, task).await {
            Ok(Ok(reply)) => HttpTransport::to_encoded_response(reply),
            Ok(Err(join_err)) => {
                error!("dispatch task failed: {}", join_err);
                HttpTransport::to_http_response(&Reply::Fault(Fault::handler_error(format!(
                    "dispatch task failed: {}",
                    join_err
                ))))
            }
            Err(_) => {
                warn!(
                    "dispatch exceeded {} ms",
                    self.limits.dispatch_timeout.as_millis()
                );
                HttpTransport::to_http_response(&Reply::Fault(Fault::handler_error(format!(
                    "dispatch exceeded {} ms",
                    self.limits.dispatch_timeout.as_millis()
                ))))
            }
        }
    }
}
