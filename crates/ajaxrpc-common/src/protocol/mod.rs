pub mod conversions;
pub mod envelope;
pub mod error;
pub mod fault;
pub mod marshal;
pub mod signature;
pub mod value;


pub use conversions::{json_to_value, value_to_json};
pub use envelope::{Reply, Request};
pub use error::{AjaxrpcError, Result};
pub use fault::{Fault, FaultCode, USER_FAULT_BASE};
pub use marshal::{FromValue, IntoParams, IntoValue, MarshalError, Params};
pub use signature::{validate_method_name, MethodDescriptor, Signature, TypeTag, METHOD_SEPARATOR};
pub use value::{StructFields, Value};
