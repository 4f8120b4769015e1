//! AjaxRPC Server
//!
//! Server side of the bridge: methods are registered with their declared
//! signatures, requests are validated against those signatures before the
//! bound handler runs, and every outcome travels back as a reply envelope.
//!
//! # Components
//!
//! - [`Handler`]: a server function, raw or adapted from a typed closure
//! - [`MethodRegistry`]: immutable name to method map
//! - [`Dispatcher`]: resolve, validate, execute and reply, plus the
//!   `system.*` introspection builtins
//! - [`HttpServer`]: hyper server that also serves the JavaScript stubs
//! - [`LocalTransport`]: in-process client transport
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ajaxrpc_common::{Fault, Request};
//! use ajaxrpc_server::{Dispatcher, Handler, MethodDeclaration, MethodRegistry};
//!
//! let registry = MethodRegistry::from_table(vec![
//!     MethodDeclaration::new(
//!         "sumintegers",
//!         Handler::from_fn(|items: Vec<i64>| Ok::<_, Fault>(items.iter().sum::<i64>())),
//!         vec!["int(array)".parse()?],
//!     )
//!     .with_help("Adds up an array of integers."),
//! ])?;
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//! let reply = dispatcher.dispatch(&Request::new("doesNotExist", ()));
//! assert_eq!(reply.fault().map(|f| f.code), Some(1));
//! # Ok::<(), ajaxrpc_common::AjaxrpcError>(())
//! ```

pub mod dispatcher;
pub mod handler;
pub mod http_router;
pub mod http_server;
pub mod js_stubs;
pub mod limits;
pub mod local;
pub mod registry;
pub mod system;

pub use dispatcher::Dispatcher;
pub use handler::{Handler, IntoHandler};
pub use http_router::AjaxrpcRouter;
pub use http_server::HttpServer;
pub use js_stubs::{render_javascript, JsStubOptions, STUBS_PATH};
pub use limits::ServerLimits;
pub use local::LocalTransport;
pub use registry::{MethodDeclaration, MethodEntry, MethodRegistry, RegistryBuilder};
pub use system::Builtin;
