use std::time::Duration;

use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};

/// Default time a call may wait for its reply.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration.
///
/// # Example
///
/// ```rust
/// use ajaxrpc_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default().with_call_timeout(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Time a call waits for its reply before faulting with
    /// `TransportTimeout`.
    pub call_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.call_timeout.is_zero() {
            return Err(AjaxrpcError::InvalidRequest(
                "call timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
