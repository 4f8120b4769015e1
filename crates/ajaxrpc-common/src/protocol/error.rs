use thiserror::Error;

use super::marshal::MarshalError;

/// Errors raised outside of a single request's fault path.
///
/// Registration-time failures (`InvalidMethodName`, `DuplicateMethod`,
/// `NamespaceCollision`) are fatal to startup. Transport failures are turned
/// into faults by the client before they reach a continuation.
#[derive(Error, Debug)]
pub enum AjaxrpcError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Invalid method name: {0}")]
    InvalidMethodName(String),

    #[error("Duplicate method: {0}")]
    DuplicateMethod(String),

    #[error("Namespace collision: {0}")]
    NamespaceCollision(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Marshalling error: {0}")]
    Marshal(#[from] MarshalError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::net::AddrParseError> for AjaxrpcError {
    fn from(err: std::net::AddrParseError) -> Self {
        AjaxrpcError::InvalidRequest(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AjaxrpcError>;
