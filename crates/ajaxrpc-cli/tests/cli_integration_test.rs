//! CLI Integration Tests
//!
//! Runs the `ajaxrpc` binary as a subprocess.
//!
//! Test Scenarios:
//! 1. Stub rendering to stdout
//! 2. URL validation (http:// prefix requirement)
//! 3. A served demo answering `call` and `methods`

use std::net::TcpListener;
use std::process::{Child, Command, Output, Stdio};
use std::thread::sleep;
use std::time::Duration;

fn ajaxrpc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ajaxrpc"))
        .args(args)
        .output()
        .expect("failed to run ajaxrpc")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A port nothing listens on once this returns.
fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Kills the server process when dropped.
struct ServerProcess(Child);

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn start_server(port: u16) -> ServerProcess {
    let bind = format!("127.0.0.1:{}", port);
    let child = Command::new(env!("CARGO_BIN_EXE_ajaxrpc"))
        .args(["serve", "-b", bind.as_str()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start ajaxrpc serve");
    ServerProcess(child)
}

// ============================================================================
// Stubs
// ============================================================================

#[test]
fn test_stubs_to_stdout() {
    let output = ajaxrpc(&["stubs", "--namespace", "demo", "--endpoint", "http://127.0.0.1:8080/"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let script = stdout(&output);
    assert!(script.contains(r#"var NAMESPACE = "demo";"#));
    assert!(script.contains(r#"var ENDPOINT = "http://127.0.0.1:8080/";"#));
    assert!(script.contains(r#""sumintegers""#));
}

#[test]
fn test_stubs_reject_bad_namespace() {
    let output = ajaxrpc(&["stubs", "--namespace", "my.ns"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("namespace"));
}

// ============================================================================
// URL validation
// ============================================================================

#[test]
fn test_call_requires_http_prefix() {
    let output = ajaxrpc(&["call", "127.0.0.1:8080", "sumintegers"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("must start with http://"));
}

#[test]
fn test_methods_requires_http_prefix() {
    let output = ajaxrpc(&["methods", "127.0.0.1:8080"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("must start with http://"));
}

#[test]
fn test_call_unreachable_server_fails() {
    let url = format!("http://127.0.0.1:{}", free_port());
    let output = ajaxrpc(&["call", url.as_str(), "sumintegers", "-p", "[[1]]"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
}

// ============================================================================
// Serve + call
// ============================================================================

#[test]
fn test_serve_then_call() {
    let port = free_port();
    let _server = start_server(port);
    let url = format!("http://127.0.0.1:{}", port);

    // Poll until the server accepts connections.
    let mut output = None;
    for _ in 0..50 {
        let attempt = ajaxrpc(&["call", url.as_str(), "sumintegers", "-p", "[[10, 11, 12]]"]);
        if attempt.status.success() {
            output = Some(attempt);
            break;
        }
        sleep(Duration::from_millis(100));
    }
    let output = output.expect("server did not come up");
    assert_eq!(stdout(&output).trim(), "33");

    let output = ajaxrpc(&["call", url.as_str(), "doesNotExist"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("doesNotExist"));

    let output = ajaxrpc(&["methods", url.as_str()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let listing = stdout(&output);
    assert!(listing.contains("sumintegers int(array)"));
    assert!(listing.contains("add double(double, double)"));
    assert!(listing.contains("echo(...)"));
}
