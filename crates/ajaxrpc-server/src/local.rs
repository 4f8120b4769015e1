//! In-process transport
//!
//! Lets an [`AjaxrpcClient`](ajaxrpc_client::AjaxrpcClient) talk to a
//! [`Dispatcher`] without a socket. The bytes still go through the codec,
//! so calls behave exactly as they would over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use ajaxrpc_client::Transport;
use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};

use crate::dispatcher::Dispatcher;

/// Client transport that dispatches on the tokio blocking pool.
#[derive(Clone)]
pub struct LocalTransport {
    dispatcher: Arc<Dispatcher>,
}

impl LocalTransport {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, payload: Bytes) -> Result<Bytes> {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::task::spawn_blocking(move || dispatcher.dispatch_bytes(&payload))
            .await
            .map_err(|e| AjaxrpcError::Transport(format!("dispatch task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ajaxrpc_client::{AjaxrpcClient, StubGenerator};
    use ajaxrpc_common::{Fault, FaultCode, Value};

    use crate::handler::Handler;
    use crate::registry::MethodRegistry;

    fn client() -> AjaxrpcClient {
        let mut builder = MethodRegistry::builder();
        builder
            .register(
                "sumintegers",
                Handler::from_fn(|items: Vec<i64>| Ok::<_, Fault>(items.iter().sum::<i64>())),
                vec!["int(array)".parse().unwrap()],
            )
            .unwrap();
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(builder.build())));
        AjaxrpcClient::from_transport(Arc::new(LocalTransport::new(dispatcher)))
    }

    #[tokio::test]
    async fn test_call_through_codec() {
        let client = client();
        let result = client.call("sumintegers", (vec![10i64, 11, 12],)).await;
        assert_eq!(result, Ok(Value::Int(33)));

        let fault = client.call("doesNotExist", ()).await.unwrap_err();
        assert!(fault.is(FaultCode::UnknownMethod));
    }

    #[tokio::test]
    async fn test_discover_and_generate() {
        let client = client();
        let descriptors = StubGenerator::discover(&client).await.unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].signatures[0].to_string(), "int(array)");

        let namespace = StubGenerator::new(client).generate(&descriptors).unwrap();
        let sum: i64 = namespace
            .get("sumintegers")
            .unwrap()
            .invoke((vec![1i64, 2, 3],))
            .await
            .unwrap();
        assert_eq!(sum, 6);
    }

    #[tokio::test]
    async fn test_signature_mismatch_reaches_client() {
        let fault = client().call("sumintegers", ("x",)).await.unwrap_err();
        assert!(fault.is(FaultCode::SignatureMismatch));
    }
}
