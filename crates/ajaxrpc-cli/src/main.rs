//! # AjaxRPC CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Serve the demo methods
//! ajaxrpc serve -b 127.0.0.1:8080
//!
//! # Make a call (outputs plain JSON)
//! ajaxrpc call http://127.0.0.1:8080 sumintegers -p '[[10, 11, 12]]'
//!
//! # List the methods a server exposes
//! ajaxrpc methods http://127.0.0.1:8080
//!
//! # Print the browser stubs for the demo methods
//! ajaxrpc stubs --namespace demo --endpoint http://127.0.0.1:8080/
//! ```
//!
//! ## URL Format
//!
//! All URLs must include the `http://` or `https://` prefix:
//! - ✅ `http://127.0.0.1:8080`
//! - ❌ `127.0.0.1:8080`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;

use ajaxrpc_client::{AjaxrpcClient, StubGenerator};
use ajaxrpc_common::value_to_json;
use ajaxrpc_server::{render_javascript, Dispatcher, HttpServer, JsStubOptions, ServerLimits};

/// Validates that a URL string starts with http:// or https://
fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

#[derive(FromArgs)]
/// AjaxRPC - typed RPC between browser script and Rust
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands.
///
/// - **Serve**: Start an HTTP server for the demo methods
/// - **Call**: Make a single call (unix-friendly JSON output)
/// - **Methods**: Introspect a running server
/// - **Stubs**: Render the JavaScript stubs to stdout
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Call(CallArgs),
    Methods(MethodsArgs),
    Stubs(StubsArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// serve the demo methods over HTTP
struct ServeArgs {
    /// address to bind the HTTP server to
    #[argh(option, short = 'b', default = "\"127.0.0.1:8080\".into()")]
    bind: String,

    /// maximum time one call may run, in milliseconds
    ///
    /// Must be between 1 and 3600000 (1 hour).
    #[argh(option, long = "max-execution-time-ms", default = "30000")]
    max_execution_time_ms: u64,

    /// largest accepted request body, in bytes
    #[argh(option, long = "max-payload-bytes", default = "10 * 1024 * 1024")]
    max_payload_bytes: usize,

    /// global object the served stubs attach their proxies to
    #[argh(option, long = "namespace", default = "\"ajaxrpc\".into()")]
    namespace: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call a method and print the result as JSON
struct CallArgs {
    /// server URL, e.g. http://127.0.0.1:8080
    #[argh(positional)]
    server_address: String,

    /// method name
    #[argh(positional)]
    method: String,

    /// parameters as a JSON array
    #[argh(option, short = 'p', long = "params", default = "\"[]\".into()")]
    params: String,

    /// call timeout in milliseconds
    #[argh(option, long = "timeout-ms", default = "30000")]
    timeout_ms: u64,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "methods")]
/// list the methods a server exposes
struct MethodsArgs {
    /// server URL, e.g. http://127.0.0.1:8080
    #[argh(positional)]
    server_address: String,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "stubs")]
/// print the JavaScript stubs for the demo methods
struct StubsArgs {
    /// global object the proxies are attached to
    #[argh(option, long = "namespace", default = "\"ajaxrpc\".into()")]
    namespace: String,

    /// URL the proxies post to
    #[argh(option, long = "endpoint", default = "\"/\".into()")]
    endpoint: String,

    /// per-call timeout in milliseconds
    #[argh(option, long = "timeout-ms", default = "30000")]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Only the server logs; the other commands keep stdout clean for piping.
    if matches!(cli.command, Commands::Serve(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Call(args) => run_call(args).await,
        Commands::Methods(args) => run_methods(args).await,
        Commands::Stubs(args) => run_stubs(args),
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let limits = ServerLimits::default()
        .with_dispatch_timeout(Duration::from_millis(args.max_execution_time_ms))
        .with_max_body_bytes(args.max_payload_bytes);
    limits.validate()?;

    let registry = ajaxrpc_cli::demo_registry()?;
    tracing::info!("Registered {} methods", registry.len());
    tracing::info!("Maximum execution time: {}ms", args.max_execution_time_ms);

    let dispatcher = Arc::new(
        Dispatcher::new(Arc::new(registry)).with_max_payload_bytes(args.max_payload_bytes),
    );
    let stubs = JsStubOptions::new().with_namespace(args.namespace);
    let server = HttpServer::new(dispatcher, limits, stubs)?;

    let addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", args.bind, e))?;
    server.run(addr).await?;
    Ok(())
}

async fn run_call(args: CallArgs) -> Result<()> {
    validate_http_url(&args.server_address, "server address")?;
    let params = ajaxrpc_cli::parse_params(&args.params)?;

    let config = ajaxrpc_client::ClientConfig::default()
        .with_call_timeout(Duration::from_millis(args.timeout_ms));
    let client = AjaxrpcClient::new(&args.server_address)?.with_config(config)?;
    let result = client.call(&args.method, params).await?;

    println!("{}", serde_json::to_string(&value_to_json(&result)?)?);
    Ok(())
}

async fn run_methods(args: MethodsArgs) -> Result<()> {
    validate_http_url(&args.server_address, "server address")?;
    let client = AjaxrpcClient::new(&args.server_address)?;

    for descriptor in StubGenerator::discover(&client).await? {
        if descriptor.signatures.is_empty() {
            println!("{}(...)", descriptor.name);
        }
        for signature in &descriptor.signatures {
            println!("{} {}", descriptor.name, signature);
        }
        if !descriptor.help.is_empty() {
            println!("    {}", descriptor.help);
        }
    }
    Ok(())
}

fn run_stubs(args: StubsArgs) -> Result<()> {
    let options = JsStubOptions::new()
        .with_namespace(args.namespace)
        .with_endpoint(args.endpoint)
        .with_timeout_ms(args.timeout_ms);
    let registry = ajaxrpc_cli::demo_registry()?;
    print!("{}", render_javascript(&registry.descriptors(), &options)?);
    Ok(())
}
