//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use dice_server::config::{ListenerConfig, ServerConfig};
use dice_server::dice::{BuiltinEngine, DiceEngine};
use dice_server::lifecycle::{self, Shutdown};

/// A server on an ephemeral local port. Stops when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(local_config(), Arc::new(BuiltinEngine::new())).await
    }

    pub async fn start_with(config: ServerConfig, engine: Arc<dyn DiceEngine>) -> Self {
        let started = lifecycle::start(config, engine).await.unwrap();
        let addr = started.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(started.server.run(started.listener, shutdown.subscribe()));

        Self {
            addr,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Trigger shutdown and wait for the accept loop to finish draining.
    pub async fn stop(mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            tokio::time::timeout(Duration::from_secs(10), handle)
                .await
                .expect("server did not stop")
                .expect("server task failed");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn local_config() -> ServerConfig {
    ServerConfig {
        listener: ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            max_connections: 64,
        },
        ..ServerConfig::default()
    }
}

/// Send raw bytes and read until the server closes the connection.
pub async fn raw_request(addr: SocketAddr, request: &[u8]) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(request).await?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `GET <target> HTTP/1.1` with a Host header.
pub async fn get(addr: SocketAddr, target: &str) -> String {
    let request = format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\n\r\n");
    raw_request(addr, request.as_bytes()).await.unwrap()
}

/// Split a raw response into status line, header lines and parsed JSON body.
pub fn split_response(raw: &str) -> (String, Vec<String>, serde_json::Value) {
    let (head, body) = raw.split_once("\r\n\r\n").expect("no blank line in response");
    let mut lines = head.split("\r\n").map(str::to_string);
    let status = lines.next().unwrap_or_default();
    let headers = lines.collect();
    let body = serde_json::from_str(body.strip_suffix("\r\n").expect("body not CRLF-terminated"))
        .expect("body is not JSON");
    (status, headers, body)
}
