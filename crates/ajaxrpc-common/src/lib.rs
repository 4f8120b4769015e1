//! AjaxRPC Common Types and Transport
//!
//! Shared building blocks for the AjaxRPC bridge, which lets browser script
//! call typed server functions over HTTP as if they were local.
//!
//! # Components
//!
//! - [`protocol`] - Value model, marshalling, signatures, faults and the
//!   request/reply envelopes
//! - [`transport`] - JSON codec and HTTP helpers
//!
//! # Wire Format
//!
//! One HTTP POST per call. The body is a request envelope, the response a
//! reply envelope, both JSON with every value tagged by its type:
//!
//! ```text
//! {"method":"sumintegers","params":[{"array":[{"int":10},{"int":11},{"int":12}]}]}
//! {"result":{"int":33}}
//! ```
//!
//! # Example
//!
//! ```
//! use ajaxrpc_common::{FromValue, IntoValue, Request, Value};
//!
//! let request = Request::new("sumintegers", (vec![10i64, 11, 12],));
//! let first = Vec::<i64>::from_value(&request.params[0]).unwrap();
//! assert_eq!(first, vec![10, 11, 12]);
//! assert_eq!(33i64.into_value(), Value::Int(33));
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
