//! HTTP Server for AjaxRPC
//!
//! Accepts HTTP/1.1 connections and hands every request to the
//! [`AjaxrpcRouter`]. Each connection runs in its own tokio task; dispatch
//! itself runs on the blocking pool.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ajaxrpc_common::Fault;
//! use ajaxrpc_server::{Dispatcher, Handler, HttpServer, JsStubOptions, MethodRegistry, ServerLimits};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut builder = MethodRegistry::builder();
//!     builder.register(
//!         "sumintegers",
//!         Handler::from_fn(|items: Vec<i64>| Ok::<_, Fault>(items.iter().sum::<i64>())),
//!         vec!["int(array)".parse()?],
//!     )?;
//!     let dispatcher = Arc::new(Dispatcher::new(Arc::new(builder.build())));
//!
//!     let server = HttpServer::new(dispatcher, ServerLimits::default(), JsStubOptions::default())?;
//!     server.run("127.0.0.1:8080".parse()?).await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use ajaxrpc_common::protocol::error::{AjaxrpcError, Result};

use crate::dispatcher::Dispatcher;
use crate::http_router::AjaxrpcRouter;
use crate::js_stubs::{render_javascript, JsStubOptions};
use crate::limits::ServerLimits;

/// HTTP server for an AjaxRPC dispatcher.
pub struct HttpServer {
    router: Arc<AjaxrpcRouter>,
}

impl HttpServer {
    /// Creates a server and renders the stub script for the registry.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if `limits` or `stubs` do not validate, or a
    /// rendering error if a method cannot be exposed to JavaScript.
    pub fn new(dispatcher: Arc<Dispatcher>, limits: ServerLimits, stubs: JsStubOptions) -> Result<Self> {
        limits.validate()?;
        let script = render_javascript(&dispatcher.registry().descriptors(), &stubs)?;
        let router = Arc::new(AjaxrpcRouter::new(dispatcher, limits, script));
        Ok(Self { router })
    }

    /// Binds `addr` and serves until the process ends.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AjaxrpcError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Serves until `shutdown` completes.
    ///
    /// Connections already accepted keep running in their own tasks.
    pub async fn serve_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        tracing::info!(
            "HTTP server listening on {}",
            listener
                .local_addr()
                .map_err(|e| AjaxrpcError::Transport(format!("Failed to get local address: {}", e)))?
        );

        tokio::pin!(shutdown);
        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted
                    .map_err(|e| AjaxrpcError::Transport(format!("Failed to accept connection: {}", e)))?,
                _ = &mut shutdown => {
                    tracing::info!("HTTP server shutting down");
                    return Ok(());
                }
            };
            tracing::debug!(%peer, "accepted connection");

            let io = TokioIo::new(stream);
            let router = self.router.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let router = router.clone();
                    async move { router.handle(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!("Error serving connection: {}", err);
                }
            });
        }
    }
}
