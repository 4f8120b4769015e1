//! Structured Error Replies
//!
//! A [`Fault`] travels back to the caller in place of a normal result. It is
//! never coerced into a success value.
//!
//! # Fault Codes
//!
//! | Kind | Code |
//! |------|------|
//! | `UnknownMethod` | 1 |
//! | `InvalidReply` | 2 |
//! | `SignatureMismatch` | 3 |
//! | `IntrospectUnknown` | 4 |
//! | `TransportFailure` | 5 |
//! | `TransportTimeout` | 6 |
//! | `MalformedRequest` | 15 |
//! | `HandlerError` | 17 |
//! | `TypeMismatch` | 18 |
//!
//! Codes from [`USER_FAULT_BASE`] upward are free for handlers to use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::marshal::MarshalError;

/// First code available for application-defined faults.
pub const USER_FAULT_BASE: i32 = 800;

/// Fault kinds produced by the bridge itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum FaultCode {
    UnknownMethod = 1,
    InvalidReply = 2,
    SignatureMismatch = 3,
    IntrospectUnknown = 4,
    TransportFailure = 5,
    TransportTimeout = 6,
    MalformedRequest = 15,
    HandlerError = 17,
    TypeMismatch = 18,
}

impl FaultCode {
    pub const ALL: [FaultCode; 9] = [
        FaultCode::UnknownMethod,
        FaultCode::InvalidReply,
        FaultCode::SignatureMismatch,
        FaultCode::IntrospectUnknown,
        FaultCode::TransportFailure,
        FaultCode::TransportTimeout,
        FaultCode::MalformedRequest,
        FaultCode::HandlerError,
        FaultCode::TypeMismatch,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Identifier used for the fault constants in generated JavaScript.
    pub fn name(self) -> &'static str {
        match self {
            FaultCode::UnknownMethod => "UnknownMethod",
            FaultCode::InvalidReply => "InvalidReply",
            FaultCode::SignatureMismatch => "SignatureMismatch",
            FaultCode::IntrospectUnknown => "IntrospectUnknown",
            FaultCode::TransportFailure => "TransportFailure",
            FaultCode::TransportTimeout => "TransportTimeout",
            FaultCode::MalformedRequest => "MalformedRequest",
            FaultCode::HandlerError => "HandlerError",
            FaultCode::TypeMismatch => "TypeMismatch",
        }
    }
}

/// Structured error reply.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("fault {code}: {message}")]
pub struct Fault {
    pub code: i32,
    pub message: String,
}

impl Fault {
    pub fn new(kind: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code: kind.code(),
            message: message.into(),
        }
    }

    /// Creates an application-defined fault.
    ///
    /// Handlers should pick codes at or above [`USER_FAULT_BASE`].
    pub fn user(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The bridge fault kind, or `None` for application codes.
    pub fn kind(&self) -> Option<FaultCode> {
        FaultCode::from_code(self.code)
    }

    pub fn is(&self, kind: FaultCode) -> bool {
        self.code == kind.code()
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::new(
            FaultCode::UnknownMethod,
            format!("Unknown method '{}'", method),
        )
    }

    pub fn signature_mismatch(method: &str, arity: usize) -> Self {
        Self::new(
            FaultCode::SignatureMismatch,
            format!(
                "No signature of '{}' matches the {} supplied parameter(s)",
                method, arity
            ),
        )
    }

    pub fn malformed_request(detail: impl std::fmt::Display) -> Self {
        Self::new(
            FaultCode::MalformedRequest,
            format!("Malformed request: {}", detail),
        )
    }

    pub fn handler_error(message: impl Into<String>) -> Self {
        Self::new(FaultCode::HandlerError, message)
    }

    pub fn type_mismatch(detail: impl std::fmt::Display) -> Self {
        Self::new(FaultCode::TypeMismatch, detail.to_string())
    }
}

impl From<MarshalError> for Fault {
    fn from(err: MarshalError) -> Self {
        Fault::type_mismatch(err)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Fault::handler_error(message)
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Fault::handler_error(message)
    }
}
