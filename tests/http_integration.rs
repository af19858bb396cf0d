//! Purpose: End-to-end tests for the HTTP read layer.
//! Exports: None (integration test module).
//! Role: Validate per-request session acquisition and the JSON payload shapes.
//! Invariants: Uses loopback-only server with temp store files.
//! Invariants: Bounded waits avoid test flakiness.
//! Invariants: Server processes are cleaned up on drop.

use serde_json::Value;
use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

struct TestServer {
    child: Child,
    base_url: String,
}

impl TestServer {
    fn start(primary: &std::path::Path, secondary: &std::path::Path, extra: &[&str]) -> TestResult<Self> {
        let mut last_err: Option<Box<dyn std::error::Error>> = None;
        for _attempt in 0..3 {
            let port = pick_port()?;
            let bind = format!("127.0.0.1:{port}");
            let base_url = format!("http://{bind}");

            let mut command = Command::new(env!("CARGO_BIN_EXE_blendb"));
            command
                .arg("--primary")
                .arg(primary)
                .arg("--secondary")
                .arg(secondary)
                .arg("serve")
                .arg("--bind")
                .arg(&bind)
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
            for arg in extra {
                command.arg(arg);
            }
            let mut child = command.spawn()?;

            match wait_for_server(&mut child, bind.parse()?) {
                Ok(()) => {
                    return Ok(Self { child, base_url });
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    last_err = Some(err);
                    sleep(Duration::from_millis(30));
                }
            }
        }
        Err(last_err.unwrap_or_else(|| "failed to start server".into()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn pick_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

fn wait_for_server(child: &mut Child, addr: SocketAddr) -> TestResult<()> {
    let url = format!("http://{addr}/healthz");
    let start = Instant::now();
    loop {
        if let Ok(resp) = ureq::get(&url).call() {
            if resp.status() == 200 {
                return Ok(());
            }
        }
        if let Some(status) = child.try_wait()? {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            let detail = stderr.trim();
            return Err(format!(
                "server exited before ready (status: {status}, stderr: {})",
                if detail.is_empty() { "<empty>" } else { detail }
            )
            .into());
        }
        if start.elapsed() > Duration::from_secs(8) {
            return Err("server did not start in time".into());
        }
        sleep(Duration::from_millis(20));
    }
}

fn get_json(url: &str) -> TestResult<Value> {
    let body = ureq::get(url).call()?.into_string()?;
    Ok(serde_json::from_str(&body)?)
}

#[test]
fn seeded_server_returns_records_per_endpoint() -> TestResult<()> {
    let temp = tempfile::tempdir()?;
    let primary = temp.path().join("primary.db");
    let secondary = temp.path().join("secondary.db");
    let server = TestServer::start(&primary, &secondary, &["--seed-sample"])?;

    let users = get_json(&server.url("/v0/users"))?;
    let users = users["users"].as_array().ok_or("users array")?;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "John Doe");
    assert_eq!(users[0]["email"], "john@example.com");
    assert!(users[0]["id"].is_i64());

    let orders = get_json(&server.url("/v0/orders"))?;
    let orders = orders["orders"].as_array().ok_or("orders array")?;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["item"], "Phone");
    assert_eq!(orders[0]["quantity"], 2);
    Ok(())
}

#[test]
fn demo_seeded_server_returns_requested_count() -> TestResult<()> {
    let temp = tempfile::tempdir()?;
    let primary = temp.path().join("primary.db");
    let secondary = temp.path().join("secondary.db");
    let server = TestServer::start(
        &primary,
        &secondary,
        &["--seed-demo", "10", "--rng-seed", "42"],
    )?;

    let users = get_json(&server.url("/v0/users"))?;
    assert_eq!(users["users"].as_array().ok_or("users array")?.len(), 10);
    let orders = get_json(&server.url("/v0/orders"))?;
    assert_eq!(orders["orders"].as_array().ok_or("orders array")?.len(), 10);
    Ok(())
}

#[test]
fn server_reads_records_added_by_the_cli() -> TestResult<()> {
    let temp = tempfile::tempdir()?;
    let primary = temp.path().join("primary.db");
    let secondary = temp.path().join("secondary.db");

    let add = Command::new(env!("CARGO_BIN_EXE_blendb"))
        .arg("--primary")
        .arg(&primary)
        .arg("--secondary")
        .arg(&secondary)
        .args(["add", "user", "--name", "Ada", "--email", "ada@example.com"])
        .output()?;
    assert!(add.status.success());

    let server = TestServer::start(&primary, &secondary, &[])?;
    let users = get_json(&server.url("/v0/users"))?;
    let users = users["users"].as_array().ok_or("users array")?;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "Ada");
    Ok(())
}

#[test]
fn healthz_and_unknown_routes() -> TestResult<()> {
    let temp = tempfile::tempdir()?;
    let primary = temp.path().join("primary.db");
    let secondary = temp.path().join("secondary.db");
    let server = TestServer::start(&primary, &secondary, &[])?;

    let health = ureq::get(&server.url("/healthz")).call()?;
    assert_eq!(health.status(), 200);
    assert_eq!(health.header("blendb-version"), Some("0"));

    let missing = ureq::get(&server.url("/v0/invoices")).call();
    match missing {
        Err(ureq::Error::Status(status, _)) => assert_eq!(status, 404),
        other => panic!("expected 404, got {other:?}"),
    }
    Ok(())
}
