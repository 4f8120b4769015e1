//! Method Registry
//!
//! Maps method names to their handler, declared signatures and help text.
//! A registry is assembled once with a [`RegistryBuilder`] (or from a
//! declaration table) and is immutable afterwards, so it can be shared
//! between request tasks behind an `Arc` without locking.
//!
//! # Example
//!
//! ```
//! use ajaxrpc_common::Fault;
//! use ajaxrpc_server::{Handler, MethodRegistry};
//!
//! let mut builder = MethodRegistry::builder();
//! builder.register(
//!     "sumintegers",
//!     Handler::from_fn(|items: Vec<i64>| Ok::<_, Fault>(items.iter().sum::<i64>())),
//!     vec!["int(array)".parse().unwrap()],
//! )?;
//! let registry = builder.build();
//!
//! assert!(registry.resolve("sumintegers").is_ok());
//! assert!(registry.resolve("doesNotExist").is_err());
//! # Ok::<(), ajaxrpc_common::AjaxrpcError>(())
//! ```

use indexmap::IndexMap;

use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};
use ajaxrpc_common::{validate_method_name, Fault, MethodDescriptor, Signature, Value};

use crate::handler::Handler;

/// Returns the first signature accepting `args`.
///
/// An empty signature list leaves the arguments unchecked and yields
/// `Ok(None)`.
pub fn select_signature<'a>(
    method: &str,
    signatures: &'a [Signature],
    args: &[Value],
) -> std::result::Result<Option<&'a Signature>, Fault> {
    if signatures.is_empty() {
        return Ok(None);
    }
    signatures
        .iter()
        .find(|signature| signature.matches(args))
        .map(Some)
        .ok_or_else(|| Fault::signature_mismatch(method, args.len()))
}

/// A registered method.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    descriptor: MethodDescriptor,
    handler: Handler,
}

impl MethodEntry {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.descriptor.signatures
    }

    pub fn help(&self) -> &str {
        &self.descriptor.help
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Validates `args` against the declared signatures.
    pub fn check(&self, args: &[Value]) -> std::result::Result<Option<&Signature>, Fault> {
        select_signature(self.name(), self.signatures(), args)
    }
}

/// One row of a static registration table.
#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    pub name: String,
    pub handler: Handler,
    pub signatures: Vec<Signature>,
    pub help: String,
}

impl MethodDeclaration {
    pub fn new(name: impl Into<String>, handler: Handler, signatures: Vec<Signature>) -> Self {
        Self {
            name: name.into(),
            handler,
            signatures,
            help: String::new(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
}

/// Collects methods before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: IndexMap<String, MethodEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method without help text.
    ///
    /// # Errors
    ///
    /// - `InvalidMethodName` if `name` is empty or contains `.`
    /// - `DuplicateMethod` if `name` is already registered (case-sensitive);
    ///   the earlier registration is kept
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Handler,
        signatures: Vec<Signature>,
    ) -> Result<&mut Self> {
        self.declare(MethodDeclaration::new(name, handler, signatures))
    }

    /// Registers a method from a full declaration.
    pub fn declare(&mut self, declaration: MethodDeclaration) -> Result<&mut Self> {
        validate_method_name(&declaration.name)?;
        if self.entries.contains_key(&declaration.name) {
            return Err(AjaxrpcError::DuplicateMethod(declaration.name));
        }

        let descriptor = MethodDescriptor::new(declaration.name.clone(), declaration.signatures)
            .with_help(declaration.help);
        self.entries.insert(
            declaration.name,
            MethodEntry {
                descriptor,
                handler: declaration.handler,
            },
        );
        Ok(self)
    }

    pub fn build(self) -> MethodRegistry {
        MethodRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable name -> method map.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    entries: IndexMap<String, MethodEntry>,
}

impl MethodRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registers a whole table; any invalid row fails the table.
    pub fn from_table(declarations: impl IntoIterator<Item = MethodDeclaration>) -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        for declaration in declarations {
            builder.declare(declaration)?;
        }
        Ok(builder.build())
    }

    /// Looks up a method, faulting with `UnknownMethod` on a miss.
    pub fn resolve(&self, name: &str) -> std::result::Result<&MethodEntry, Fault> {
        self.entries
            .get(name)
            .ok_or_else(|| Fault::unknown_method(name))
    }

    pub fn get(&self, name: &str) -> Option<&MethodEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Method names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<MethodDescriptor> {
        self.entries
            .values()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
