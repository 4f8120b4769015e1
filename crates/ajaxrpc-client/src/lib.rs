//! AjaxRPC Client
//!
//! Calls remote methods from Rust, either directly through
//! [`AjaxrpcClient`] or through [`Proxy`] objects that a [`StubGenerator`]
//! builds from method descriptors.
//!
//! Every proxy call returns immediately. The outcome reaches the supplied
//! continuation exactly once, as `Ok(result)` or `Err(fault)`, including
//! when the transport fails or the call task is dropped.
//!
//! # Example
//!
//! ```no_run
//! use ajaxrpc_client::{AjaxrpcClient, StubGenerator};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AjaxrpcClient::new("http://127.0.0.1:8080/")?;
//! let descriptors = StubGenerator::discover(&client).await?;
//! let namespace = StubGenerator::new(client).generate(&descriptors)?;
//!
//! let sum = namespace.get("sumintegers").unwrap();
//! sum.call((vec![10i64, 11, 12],), |outcome: Result<i64, _>| {
//!     println!("{:?}", outcome);
//! })
//! .wait()
//! .await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod continuation;
pub mod stub;
pub mod transport;

pub use client::AjaxrpcClient;
pub use config::ClientConfig;
pub use continuation::{Continuation, PendingCall};
pub use stub::{Namespace, Proxy, StubGenerator};
pub use transport::{HttpTransportClient, Transport};
