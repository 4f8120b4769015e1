//! Exactly-once Continuations
//!
//! A [`Continuation`] wraps the caller's callback. It is consumed by
//! [`deliver`](Continuation::deliver); if it is dropped undelivered, for
//! example because the call task was aborted or the runtime shut down, the
//! drop delivers a `TransportFailure` fault instead. The callback therefore
//! runs exactly once on every path.

use ajaxrpc_common::{Fault, FaultCode};
use tokio::task::JoinHandle;

type Callback<R> = Box<dyn FnOnce(Result<R, Fault>) + Send>;

pub struct Continuation<R> {
    callback: Option<Callback<R>>,
}

impl<R> Continuation<R> {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Result<R, Fault>) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Runs the callback with `outcome`.
    pub fn deliver(mut self, outcome: Result<R, Fault>) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }
}

impl<R> Drop for Continuation<R> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback(Err(Fault::new(
                FaultCode::TransportFailure,
                "call abandoned before a reply arrived",
            )));
        }
    }
}

impl<R> std::fmt::Debug for Continuation<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Continuation")
            .field("delivered", &self.callback.is_none())
            .finish()
    }
}

/// Handle to a call in flight.
///
/// Dropping it does not cancel the call. [`abort`](PendingCall::abort)
/// does, and the continuation then receives a `TransportFailure` fault.
#[derive(Debug)]
pub struct PendingCall {
    handle: Option<JoinHandle<()>>,
}

impl PendingCall {
    pub(crate) fn spawned(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// A call whose continuation already ran before it could be spawned.
    pub(crate) fn completed() -> Self {
        Self { handle: None }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Waits until the continuation has run.
    pub async fn wait(self) {
        if let Some(handle) = self.handle {
            // A cancelled or panicked task has already delivered through
            // the continuation's drop.
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<Result<i64, Fault>>>>, Continuation<i64>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let continuation = Continuation::new(move |outcome| sink.lock().unwrap().push(outcome));
        (seen, continuation)
    }

    #[test]
    fn test_deliver_runs_once() {
        let (seen, continuation) = recorder();
        continuation.deliver(Ok(7));
        assert_eq!(*seen.lock().unwrap(), vec![Ok(7)]);
    }

    #[test]
    fn test_drop_delivers_transport_failure() {
        let (seen, continuation) = recorder();
        drop(continuation);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_ref().unwrap_err().is(FaultCode::TransportFailure));
    }

    #[tokio::test]
    async fn test_aborted_task_delivers_once() {
        let (seen, continuation) = recorder();
        let handle = tokio::spawn(async move {
            std::future::pending::<()>().await;
            continuation.deliver(Ok(1));
        });
        let pending = PendingCall::spawned(handle);
        pending.abort();
        pending.wait().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_err());
    }

    #[tokio::test]
    async fn test_panicking_task_delivers_once() {
        let (seen, continuation) = recorder();
        let handle = tokio::spawn(async move {
            let _guard = continuation;
            panic!("handler blew up");
        });
        PendingCall::spawned(handle).wait().await;

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_completed_is_finished() {
        assert!(PendingCall::completed().is_finished());
    }
}
