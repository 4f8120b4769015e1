//! Tests for proxy generation and continuation delivery
//!
//! The transports here answer in-process: they decode the request envelope,
//! compute a reply and encode it, so the full client path runs without a
//! server.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::transport::Transport;
    use ajaxrpc_common::protocol::error::Result as TransportResult;
    use ajaxrpc_common::transport::JsonCodec;
    use ajaxrpc_common::{IntoValue, Reply, Request, Value};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Responder = dyn Fn(&Request) -> Reply + Send + Sync;

    /// Answers every request with `respond`, after `delay_ms(request)`.
    struct Scripted {
        respond: Box<Responder>,
        delay_ms: fn(&Request) -> u64,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(respond: impl Fn(&Request) -> Reply + Send + Sync + 'static) -> Self {
            Self {
                respond: Box::new(respond),
                delay_ms: |_| 0,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(&self, payload: Bytes) -> TransportResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let codec = JsonCodec::default();
            let request = codec.decode_request(&payload)?;
            let delay = (self.delay_ms)(&request);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            codec.encode_reply(&(self.respond)(&request))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(&self, _payload: Bytes) -> TransportResult<Bytes> {
            Err(AjaxrpcError::Transport("connection refused".into()))
        }
    }

    fn sum_server(request: &Request) -> Reply {
        match request.method.as_str() {
            "sumintegers" => {
                let total = request.params[0]
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|item| i64::from_value(item).ok())
                            .sum::<i64>()
                    })
                    .unwrap_or(0);
                Reply::Result(Value::Int(total))
            }
            "echo" => Reply::Result(request.params.first().cloned().unwrap_or(Value::Nil)),
            other => Reply::Fault(Fault::unknown_method(other)),
        }
    }

    fn descriptor(name: &str, signature: &str) -> MethodDescriptor {
        MethodDescriptor::new(name, vec![signature.parse().unwrap()])
    }

    fn client_for(transport: impl Transport + 'static) -> AjaxrpcClient {
        AjaxrpcClient::from_transport(Arc::new(transport))
    }

    fn recorder<R: Send + 'static>() -> (
        Arc<Mutex<Vec<std::result::Result<R, Fault>>>>,
        impl FnOnce(std::result::Result<R, Fault>) + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |outcome| sink.lock().unwrap().push(outcome))
    }

    #[test]
    fn test_generate_one_proxy_per_descriptor() {
        let generator = StubGenerator::new(client_for(Unreachable));
        let namespace = generator
            .generate(&[
                descriptor("sumintegers", "int(array)"),
                descriptor("echo", "any(any)"),
            ])
            .unwrap();

        assert_eq!(namespace.names().collect::<Vec<_>>(), vec!["sumintegers", "echo"]);
        let proxy = namespace.get("sumintegers").unwrap();
        assert_eq!(proxy.name(), "sumintegers");
        assert_eq!(proxy.signatures()[0].to_string(), "int(array)");
    }

    #[test]
    fn test_reserved_name_collides() {
        let generator = StubGenerator::new(client_for(Unreachable));
        let mut namespace = Namespace::with_reserved(["alert"]);

        let err = generator
            .generate_into(
                &[descriptor("echo", "any(any)"), descriptor("alert", "nil(string)")],
                &mut namespace,
            )
            .unwrap_err();

        assert!(matches!(err, AjaxrpcError::NamespaceCollision(_)));
        // nothing from the failed batch was inserted
        assert!(namespace.is_empty());
        assert!(!namespace.contains("echo"));
    }

    #[test]
    fn test_second_generation_collides_with_first() {
        let generator = StubGenerator::new(client_for(Unreachable));
        let mut namespace = Namespace::new();
        let descriptors = [descriptor("echo", "any(any)")];

        generator.generate_into(&descriptors, &mut namespace).unwrap();
        assert!(matches!(
            generator.generate_into(&descriptors, &mut namespace),
            Err(AjaxrpcError::NamespaceCollision(_))
        ));
        assert_eq!(namespace.len(), 1);
    }

    #[test]
    fn test_duplicate_in_input_collides() {
        let generator = StubGenerator::new(client_for(Unreachable));
        let result = generator.generate(&[descriptor("echo", "any(any)"), descriptor("echo", "int(int)")]);
        assert!(matches!(result, Err(AjaxrpcError::NamespaceCollision(_))));
    }

    #[test]
    fn test_dotted_name_rejected() {
        let generator = StubGenerator::new(client_for(Unreachable));
        let result = generator.generate(&[descriptor("system.listMethods", "array()")]);
        assert!(matches!(result, Err(AjaxrpcError::InvalidMethodName(_))));
    }

    #[tokio::test]
    async fn test_call_delivers_result_once() {
        let namespace = StubGenerator::new(client_for(Scripted::new(sum_server)))
            .generate(&[descriptor("sumintegers", "int(array)")])
            .unwrap();

        let (seen, continuation) = recorder::<i64>();
        namespace
            .get("sumintegers")
            .unwrap()
            .call((vec![10i64, 11, 12],), continuation)
            .wait()
            .await;

        assert_eq!(*seen.lock().unwrap(), vec![Ok(33)]);
    }

    #[tokio::test]
    async fn test_server_fault_reaches_continuation() {
        let namespace = StubGenerator::new(client_for(Scripted::new(sum_server)))
            .generate(&[descriptor("doesNotExist", "nil()")])
            .unwrap();

        let (seen, continuation) = recorder::<Value>();
        namespace.get("doesNotExist").unwrap().call((), continuation).wait().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_ref().unwrap_err().is(FaultCode::UnknownMethod));
    }

    #[tokio::test]
    async fn test_transport_failure_delivers_once() {
        let namespace = StubGenerator::new(client_for(Unreachable))
            .generate(&[descriptor("echo", "any(any)")])
            .unwrap();

        let (seen, continuation) = recorder::<Value>();
        namespace.get("echo").unwrap().call(("hi",), continuation).wait().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_ref().unwrap_err().is(FaultCode::TransportFailure));
    }

    #[tokio::test]
    async fn test_abort_delivers_once() {
        let mut transport = Scripted::new(sum_server);
        transport.delay_ms = |_| 10_000;
        let namespace = StubGenerator::new(client_for(transport))
            .generate(&[descriptor("echo", "any(any)")])
            .unwrap();

        let (seen, continuation) = recorder::<Value>();
        let pending = namespace.get("echo").unwrap().call(("hi",), continuation);
        pending.abort();
        pending.wait().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_ref().unwrap_err().is(FaultCode::TransportFailure));
    }

    #[test]
    fn test_call_without_runtime_faults_immediately() {
        let namespace = StubGenerator::new(client_for(Scripted::new(sum_server)))
            .generate(&[descriptor("echo", "any(any)")])
            .unwrap();

        let (seen, continuation) = recorder::<Value>();
        let pending = namespace.get("echo").unwrap().call(("hi",), continuation);

        assert!(pending.is_finished());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].as_ref().unwrap_err().is(FaultCode::TransportFailure));
    }

    #[tokio::test]
    async fn test_concurrent_calls_see_only_their_own_result() {
        let mut transport = Scripted::new(sum_server);
        // later calls finish first
        transport.delay_ms = |request| {
            let n = i64::from_value(&request.params[0]).unwrap_or(0);
            (50 - n).max(0) as u64
        };
        let transport = Arc::new(transport);
        let client = AjaxrpcClient::from_transport(transport.clone());
        let namespace = StubGenerator::new(client)
            .generate(&[descriptor("echo", "int(int)")])
            .unwrap();
        let proxy = namespace.get("echo").unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let pending: Vec<_> = (0..50i64)
            .map(|n| {
                let tx = tx.clone();
                proxy.call((n,), move |outcome: std::result::Result<i64, Fault>| {
                    let _ = tx.send((n, outcome));
                })
            })
            .collect();
        drop(tx);
        for call in pending {
            call.wait().await;
        }

        let mut delivered = 0;
        while let Some((n, outcome)) = rx.recv().await {
            assert_eq!(outcome, Ok(n));
            delivered += 1;
        }
        assert_eq!(delivered, 50);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn test_invoke_decodes_result() {
        let namespace = StubGenerator::new(client_for(Scripted::new(sum_server)))
            .generate(&[descriptor("echo", "string(string)")])
            .unwrap();

        let echoed: String = namespace.get("echo").unwrap().invoke(("hello",)).await.unwrap();
        assert_eq!(echoed, "hello");

        let mismatch = namespace.get("echo").unwrap().invoke::<i64>(("hello",)).await;
        assert!(mismatch.unwrap_err().is(FaultCode::TypeMismatch));
    }

    #[tokio::test]
    async fn test_discover_skips_builtins() {
        let transport = Scripted::new(|request: &Request| match request.method.as_str() {
            "system.listMethods" => Reply::Result(
                vec!["sumintegers", "system.listMethods", "system.methodHelp"].into_value(),
            ),
            "system.methodSignature" => {
                Reply::Result(vec![vec!["int", "array"]].into_value())
            }
            "system.methodHelp" => Reply::Result("Adds integers".into_value()),
            other => Reply::Fault(Fault::unknown_method(other)),
        });

        let descriptors = StubGenerator::discover(&client_for(transport)).await.unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "sumintegers");
        assert_eq!(descriptors[0].signatures[0].to_string(), "int(array)");
        assert_eq!(descriptors[0].help, "Adds integers");
    }
}
