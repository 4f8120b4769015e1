//! Proxy Generation
//!
//! [`StubGenerator`] turns method descriptors into callable [`Proxy`]
//! objects collected in a [`Namespace`]. A proxy carries only the method
//! name and a client handle; it performs no local signature checks, the
//! server is the single authority on argument validity.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ajaxrpc_client::{AjaxrpcClient, Namespace, StubGenerator};
//! use ajaxrpc_common::{MethodDescriptor, Signature};
//!
//! let client = AjaxrpcClient::new("http://127.0.0.1:8080/").unwrap();
//! let descriptors = vec![MethodDescriptor::new(
//!     "sumintegers",
//!     vec!["int(array)".parse::<Signature>().unwrap()],
//! )];
//!
//! let mut namespace = Namespace::with_reserved(["window", "document"]);
//! StubGenerator::new(client).generate_into(&descriptors, &mut namespace).unwrap();
//! assert!(namespace.contains("sumintegers"));
//! ```

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};
use ajaxrpc_common::{
    validate_method_name, Fault, FaultCode, FromValue, IntoParams, MethodDescriptor, Signature,
    METHOD_SEPARATOR,
};

use crate::client::AjaxrpcClient;
use crate::continuation::{Continuation, PendingCall};

/// Client-side callable bound to one remote method.
#[derive(Debug, Clone)]
pub struct Proxy {
    descriptor: MethodDescriptor,
    client: AjaxrpcClient,
}

impl Proxy {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Signatures the server declared, for display only.
    pub fn signatures(&self) -> &[Signature] {
        &self.descriptor.signatures
    }

    pub fn help(&self) -> &str {
        &self.descriptor.help
    }

    /// Sends the call and returns at once.
    ///
    /// `continuation` later receives exactly one outcome: the decoded
    /// result, or a fault from the server, the transport, or decoding. With
    /// no Tokio runtime on the current thread it runs immediately with a
    /// `TransportFailure` fault.
    pub fn call<P, R, F>(&self, params: P, continuation: F) -> PendingCall
    where
        P: IntoParams,
        R: FromValue + Send + 'static,
        F: FnOnce(std::result::Result<R, Fault>) + Send + 'static,
    {
        let continuation = Continuation::new(continuation);
        let params = params.into_params();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                continuation.deliver(Err(Fault::new(
                    FaultCode::TransportFailure,
                    format!("no async runtime to send '{}' on", self.name()),
                )));
                return PendingCall::completed();
            }
        };

        let client = self.client.clone();
        let method = self.descriptor.name.clone();
        PendingCall::spawned(runtime.spawn(async move {
            let outcome = client.call_as::<R>(&method, params).await;
            continuation.deliver(outcome);
        }))
    }

    /// Awaitable form of [`call`](Proxy::call).
    pub async fn invoke<R: FromValue>(&self, params: impl IntoParams) -> std::result::Result<R, Fault> {
        self.client.call_as(&self.descriptor.name, params).await
    }
}

/// Named proxies plus the identifiers they must not shadow.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    reserved: HashSet<String>,
    proxies: IndexMap<String, Proxy>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A namespace in which `names` are already taken.
    pub fn with_reserved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: names.into_iter().map(Into::into).collect(),
            proxies: IndexMap::new(),
        }
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    pub fn get(&self, name: &str) -> Option<&Proxy> {
        self.proxies.get(name)
    }

    /// `true` if `name` is reserved or already bound to a proxy.
    pub fn contains(&self, name: &str) -> bool {
        self.reserved.contains(name) || self.proxies.contains_key(name)
    }

    /// Proxy names in generation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.proxies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Proxy)> {
        self.proxies.iter().map(|(name, proxy)| (name.as_str(), proxy))
    }
}

/// Builds proxies that send through one client.
#[derive(Debug, Clone)]
pub struct StubGenerator {
    client: AjaxrpcClient,
}

impl StubGenerator {
    pub fn new(client: AjaxrpcClient) -> Self {
        Self { client }
    }

    /// Generates a fresh namespace holding one proxy per descriptor.
    pub fn generate(&self, descriptors: &[MethodDescriptor]) -> Result<Namespace> {
        let mut namespace = Namespace::new();
        self.generate_into(descriptors, &mut namespace)?;
        Ok(namespace)
    }

    /// Adds one proxy per descriptor to `namespace`.
    ///
    /// All names are checked before anything is inserted, so on error the
    /// namespace is left as it was.
    ///
    /// # Errors
    ///
    /// - `InvalidMethodName` for an empty name or one containing `.`
    /// - `NamespaceCollision` for a name that is reserved, already bound,
    ///   or repeated within `descriptors`
    pub fn generate_into(
        &self,
        descriptors: &[MethodDescriptor],
        namespace: &mut Namespace,
    ) -> Result<()> {
        let mut incoming = HashSet::with_capacity(descriptors.len());
        for descriptor in descriptors {
            validate_method_name(&descriptor.name)?;
            if namespace.contains(&descriptor.name) || !incoming.insert(descriptor.name.as_str()) {
                return Err(AjaxrpcError::NamespaceCollision(format!(
                    "'{}' is already defined in the target namespace",
                    descriptor.name
                )));
            }
        }

        for descriptor in descriptors {
            debug!(method = %descriptor.name, "generated proxy");
            namespace.proxies.insert(
                descriptor.name.clone(),
                Proxy {
                    descriptor: descriptor.clone(),
                    client: self.client.clone(),
                },
            );
        }
        Ok(())
    }

    /// Fetches the descriptors of every user method a server exposes.
    ///
    /// Builtins (names containing `.`) are skipped.
    pub async fn discover(client: &AjaxrpcClient) -> std::result::Result<Vec<MethodDescriptor>, Fault> {
        let names = client.list_methods().await?;
        let mut descriptors = Vec::with_capacity(names.len());
        for name in names.into_iter().filter(|name| !name.contains(METHOD_SEPARATOR)) {
            let signatures = client.method_signatures(&name).await?;
            let help = client.method_help(&name).await?;
            descriptors.push(MethodDescriptor::new(name, signatures).with_help(help));
        }
        Ok(descriptors)
    }
}

#[cfg(test)]
mod tests;
