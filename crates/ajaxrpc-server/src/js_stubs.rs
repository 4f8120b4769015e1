//! JavaScript Stubs
//!
//! Renders the browser side of the bridge: a small runtime (value
//! encoder/decoder, XMLHttpRequest transport, fault table) followed by one
//! proxy function per method on a namespace object.
//!
//! A generated proxy takes the method arguments followed by a continuation
//! and calls it exactly once, as `continuation(result, null)` or
//! `continuation(null, fault)`:
//!
//! ```js
//! ajaxrpc.sumintegers([10, 11, 12], function (result, fault) {
//!     if (fault) { alert(fault.message); } else { alert(result); }
//! });
//! ```
//!
//! Integral JS numbers travel as `int`; wrap a value in
//! `ajaxrpc.$rpc.double(x)` to force `double`.

use std::collections::HashSet;

use serde_json::Map;

use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};
use ajaxrpc_common::{FaultCode, MethodDescriptor};

const RUNTIME_TEMPLATE: &str = include_str!("../assets/ajaxrpc.js");

/// Path the HTTP server serves the rendered stubs on.
pub const STUBS_PATH: &str = "/stubs.js";

/// Options for [`render_javascript`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsStubOptions {
    /// Global object the proxies are attached to
    pub namespace: String,
    /// URL the proxies POST to
    pub endpoint: String,
    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for JsStubOptions {
    fn default() -> Self {
        Self {
            namespace: "ajaxrpc".to_string(),
            endpoint: "/".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl JsStubOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !is_js_identifier(&self.namespace) {
            return Err(AjaxrpcError::InvalidRequest(format!(
                "namespace '{}' is not a JavaScript identifier",
                self.namespace
            )));
        }
        if self.endpoint.is_empty() {
            return Err(AjaxrpcError::InvalidRequest("endpoint must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(AjaxrpcError::InvalidRequest(
                "timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// `^[A-Za-z_][A-Za-z0-9_]*$`
fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Renders the stub script for `descriptors`.
///
/// # Errors
///
/// - `InvalidRequest` if the options do not validate
/// - `InvalidMethodName` if a method name is not a plain JS identifier
/// - `NamespaceCollision` if a name appears twice
pub fn render_javascript(descriptors: &[MethodDescriptor], options: &JsStubOptions) -> Result<String> {
    options.validate()?;

    let mut seen = HashSet::new();
    for descriptor in descriptors {
        if !is_js_identifier(&descriptor.name) {
            return Err(AjaxrpcError::InvalidMethodName(format!(
                "'{}' cannot be exposed to JavaScript",
                descriptor.name
            )));
        }
        if !seen.insert(descriptor.name.as_str()) {
            return Err(AjaxrpcError::NamespaceCollision(descriptor.name.clone()));
        }
    }

    let faults: Map<String, serde_json::Value> = FaultCode::ALL
        .iter()
        .map(|kind| (kind.name().to_string(), kind.code().into()))
        .collect();
    let methods: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();

    Ok(RUNTIME_TEMPLATE
        .replace("__AJAXRPC_NAMESPACE__", &serde_json::to_string(&options.namespace)?)
        .replace("__AJAXRPC_ENDPOINT__", &serde_json::to_string(&options.endpoint)?)
        .replace("__AJAXRPC_TIMEOUT_MS__", &options.timeout_ms.to_string())
        .replace("__AJAXRPC_FAULTS__", &serde_json::to_string(&faults)?)
        .replace("__AJAXRPC_METHODS__", &serde_json::to_string(&methods)?))
}
