//! Request Dispatcher
//!
//! Turns a decoded [`Request`] into a [`Reply`]. Every request runs through
//! the same stages, and each stage may end it with a fault:
//!
//! 1. **Received**: the method name must not be empty (`MalformedRequest`)
//! 2. **Resolved**: `system.*` builtins first, then the registry
//!    (`UnknownMethod`)
//! 3. **Validated**: the first declared signature that accepts the
//!    arguments wins (`SignatureMismatch`); the handler is not invoked
//! 4. **Executed**: handler errors and panics become faults
//!    (`HandlerError` or the handler's own fault)
//! 5. **Replied**: the result value is wrapped in a reply
//!
//! Dispatch is synchronous. The HTTP layer runs it on the blocking pool so a
//! slow handler never stalls the accept loop.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, warn};

use ajaxrpc_common::transport::JsonCodec;
use ajaxrpc_common::{Fault, FaultCode, Params, Reply, Request, Value};
use ajaxrpc_metrics::{DispatchMetricsCollector, MetricsCollector};

use crate::handler::Handler;
use crate::registry::MethodRegistry;
use crate::system::Builtin;

/// Signature-checked request dispatcher.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ajaxrpc_common::{Fault, Reply, Request, Value};
/// use ajaxrpc_server::{Dispatcher, Handler, MethodRegistry};
///
/// let mut builder = MethodRegistry::builder();
/// builder.register(
///     "sumintegers",
///     Handler::from_fn(|items: Vec<i64>| Ok::<_, Fault>(items.iter().sum::<i64>())),
///     vec!["int(array)".parse().unwrap()],
/// ).unwrap();
///
/// let dispatcher = Dispatcher::new(Arc::new(builder.build()));
/// let reply = dispatcher.dispatch(&Request::new("sumintegers", (vec![10i64, 11, 12],)));
/// assert_eq!(reply, Reply::Result(Value::Int(33)));
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    metrics: Arc<dyn MetricsCollector>,
    codec: JsonCodec,
}

impl Dispatcher {
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self {
            registry,
            metrics: Arc::new(DispatchMetricsCollector::new()),
            codec: JsonCodec::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Limits the size of payloads accepted by [`dispatch_bytes`](Self::dispatch_bytes).
    pub fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.codec = JsonCodec::with_max_payload_bytes(max_payload_bytes);
        self
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &dyn MetricsCollector {
        self.metrics.as_ref()
    }

    /// Dispatches one decoded request.
    pub fn dispatch(&self, request: &Request) -> Reply {
        let params = request.params();
        let reply = Reply::from(self.call_method(&request.method, &params, false));
        if let Reply::Fault(fault) = &reply {
            warn!(method = %request.method, code = fault.code, "call faulted: {}", fault.message);
        }
        reply
    }

    /// Decodes `payload`, dispatches it and encodes the reply.
    ///
    /// An undecodable payload yields a `MalformedRequest` fault reply; this
    /// never fails.
    pub fn dispatch_bytes(&self, payload: &[u8]) -> Bytes {
        let reply = match self.codec.decode_request(payload) {
            Ok(request) => self.dispatch(&request),
            Err(e) => {
                warn!("rejecting undecodable request: {}", e);
                self.metrics.record_unrouted();
                Reply::Fault(Fault::malformed_request(e))
            }
        };

        self.codec.encode_reply(&reply).unwrap_or_else(|e| {
            warn!("reply could not be encoded: {}", e);
            let fallback = Reply::Fault(Fault::handler_error(format!(
                "reply could not be encoded: {}",
                e
            )));
            Bytes::from(serde_json::to_vec(&fallback).unwrap_or_default())
        })
    }

    /// Resolves, validates and runs one call.
    ///
    /// `in_multicall` is set for calls issued from `system.multicall`, which
    /// may not recurse into itself.
    pub(crate) fn call_method(
        &self,
        method: &str,
        params: &Params,
        in_multicall: bool,
    ) -> Result<Value, Fault> {
        debug!(method, params = params.len(), "received");
        if method.is_empty() {
            self.metrics.record_unrouted();
            return Err(Fault::malformed_request("method name is empty"));
        }

        if let Some(builtin) = Builtin::from_name(method) {
            debug!(method, "serving builtin");
            return builtin.call(self, params, in_multicall);
        }

        let entry = match self.registry.resolve(method) {
            Ok(entry) => entry,
            Err(fault) => {
                self.metrics.record_unrouted();
                return Err(fault);
            }
        };
        debug!(method, "resolved");

        let start = Instant::now();
        let outcome = entry.check(params.as_slice()).and_then(|signature| {
            if let Some(signature) = signature {
                debug!(method, %signature, "validated");
            }
            run_handler(entry.handler(), params)
        });
        debug!(method, ok = outcome.is_ok(), "executed");

        self.metrics.record_call(method, start, outcome.is_ok());
        outcome
    }
}

fn run_handler(handler: &Handler, params: &Params) -> Result<Value, Fault> {
    catch_unwind(AssertUnwindSafe(|| handler.call(params))).unwrap_or_else(|panic| {
        Err(Fault::new(
            FaultCode::HandlerError,
            format!("handler panicked: {}", panic_message(panic.as_ref())),
        ))
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
