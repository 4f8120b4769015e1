//! Per-request bounds enforced by the HTTP router.

use std::time::Duration;

use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};
use ajaxrpc_common::transport::DEFAULT_MAX_PAYLOAD_BYTES;

/// Default time one dispatch may take before the caller gets a fault.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest dispatch timeout [`ServerLimits::validate`] accepts.
pub const MAX_DISPATCH_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// How long a dispatch may run and how large a request body may be.
///
/// A dispatch that outlives `dispatch_timeout` is answered with a
/// `HandlerError` fault. The handler keeps running on the blocking pool
/// until it returns; synchronous code cannot be interrupted.
///
/// ```
/// use ajaxrpc_server::ServerLimits;
/// use std::time::Duration;
///
/// let limits = ServerLimits::default()
///     .with_dispatch_timeout(Duration::from_secs(5))
///     .with_max_body_bytes(64 * 1024);
/// assert!(limits.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerLimits {
    pub dispatch_timeout: Duration,
    /// Bodies larger than this are answered with a `MalformedRequest` fault
    /// without being parsed.
    pub max_body_bytes: usize,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl ServerLimits {
    pub fn with_dispatch_timeout(mut self, dispatch_timeout: Duration) -> Self {
        self.dispatch_timeout = dispatch_timeout;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// # Errors
    ///
    /// `InvalidRequest` for a zero timeout, a timeout above
    /// [`MAX_DISPATCH_TIMEOUT`], or a zero body limit.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch_timeout.is_zero() {
            return Err(AjaxrpcError::InvalidRequest(
                "dispatch timeout must be non-zero".into(),
            ));
        }
        if self.dispatch_timeout > MAX_DISPATCH_TIMEOUT {
            return Err(AjaxrpcError::InvalidRequest(format!(
                "dispatch timeout of {:?} is above the {:?} ceiling",
                self.dispatch_timeout, MAX_DISPATCH_TIMEOUT
            )));
        }
        if self.max_body_bytes == 0 {
            return Err(AjaxrpcError::InvalidRequest(
                "body limit must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
