//! End-to-end tests over real TCP connections.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use dice_server::dice::{BuiltinEngine, DiceEngine};

mod common;

use common::{get, local_config, raw_request, split_response, TestServer};

#[tokio::test]
async fn single_roll() {
    let server = TestServer::start().await;
    let raw = get(server.addr, "/?game=Cthulhu7th&dice=1d10").await;

    let (status, headers, body) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(headers, vec!["Content-Type: application/json".to_string()]);

    let re = Regex::new(r"^\(1D10\) ＞ \d\d?$").unwrap();
    let text = body["body"].as_str().unwrap();
    assert!(re.is_match(text), "{text}");
    assert!(body.get("error").is_none());

    server.stop().await;
}

#[tokio::test]
async fn repeated_roll() {
    let server = TestServer::start().await;
    let raw = get(server.addr, "/?game=Cthulhu7th&dice=x2+1d100").await;

    let (status, _, body) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");
    let re = Regex::new(r"^#1\n\(1D100\) ＞ \d{1,3}\n\n#2\n\(1D100\) ＞ \d{1,3}$").unwrap();
    let text = body["body"].as_str().unwrap();
    assert!(re.is_match(text), "{text}");
    // Newlines travel JSON-escaped.
    assert!(raw.contains(r"\n\n#2"));
}

#[tokio::test]
async fn roll_failures_are_400() {
    let server = TestServer::start().await;

    for target in [
        "/?dice=1d10",
        "/?game=Emoklore&dice=invalid+dice",
        "/?game=NoSuchGame&dice=1d6",
        "/?game=Emoklore",
    ] {
        let (status, _, body) = split_response(&get(server.addr, target).await);
        assert_eq!(status, "HTTP/1.1 400 Bad Request", "{target}");
        assert_eq!(body["error"], "不正な入力", "{target}");
    }
}

#[tokio::test]
async fn bad_queries_are_400() {
    let server = TestServer::start().await;

    for target in ["/?game=DiceBot&foo=1", "/?game", "/", "/?game=DiceBot&"] {
        let (status, _, body) = split_response(&get(server.addr, target).await);
        assert_eq!(status, "HTTP/1.1 400 Bad Request", "{target}");
        assert_eq!(body["error"], "invalid request query", "{target}");
    }
}

#[tokio::test]
async fn malformed_request_line() {
    let server = TestServer::start().await;
    let raw = raw_request(server.addr, b"HELLO\r\n\r\n").await.unwrap();

    let (status, _, body) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 400 Bad Request");
    assert_eq!(body["error"], "invalid http request format");
}

#[tokio::test]
async fn headers_are_ignored() {
    let server = TestServer::start().await;
    let request = b"GET /?game=DiceBot&dice=3d1 HTTP/1.1\r\n\
        Host: example\r\n\
        Accept: */*\r\n\
        X-Anything: ?game=Emoklore&dice=nope\r\n\
        \r\n";
    let raw = raw_request(server.addr, request).await.unwrap();

    let (status, _, body) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body["body"], "(3D1) ＞ 3[1,1,1] ＞ 3");
}

#[tokio::test]
async fn concurrent_requests_get_their_own_response() {
    let server = TestServer::start().await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 1..=20u32 {
        let addr = server.addr;
        tasks.spawn(async move {
            let raw = get(addr, &format!("/?game=DiceBot&dice={i}d1")).await;
            (i, raw)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (i, raw) = joined.unwrap();
        let (status, _, body) = split_response(&raw);
        assert_eq!(status, "HTTP/1.1 200 OK");
        let text = body["body"].as_str().unwrap();
        assert!(text.starts_with(&format!("({i}D1) ＞ ")), "{i}: {text}");
        assert!(text.ends_with(&format!("＞ {i}")), "{i}: {text}");
    }
}

#[tokio::test]
async fn connection_limit_applies_backpressure() {
    let mut config = local_config();
    config.listener.max_connections = 1;
    let server = TestServer::start_with(config, Arc::new(BuiltinEngine::new())).await;

    // Holds the only slot without sending anything.
    let idle = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut waiting = TcpStream::connect(server.addr).await.unwrap();
    waiting
        .write_all(b"GET /?game=DiceBot&dice=1d1 HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    let mut buf = Vec::new();
    let early =
        tokio::time::timeout(Duration::from_millis(300), waiting.read_to_end(&mut buf)).await;
    assert!(early.is_err(), "served while the limit was reached");

    drop(idle);
    tokio::time::timeout(Duration::from_secs(5), waiting.read_to_end(&mut buf))
        .await
        .expect("not served after the slot freed")
        .unwrap();
    let (status, _, body) = split_response(&String::from_utf8(buf).unwrap());
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body["body"], "(1D1) ＞ 1");
}

struct PanickingEngine(BuiltinEngine);

impl DiceEngine for PanickingEngine {
    fn is_supported(&self, game_system: &str) -> bool {
        game_system == "Panic" || self.0.is_supported(game_system)
    }

    fn evaluate(&self, game_system: &str, notation: &str) -> Option<String> {
        if game_system == "Panic" {
            panic!("engine blew up on {notation}");
        }
        self.0.evaluate(game_system, notation)
    }
}

#[tokio::test]
async fn handler_panic_is_isolated() {
    let mut config = local_config();
    config.listener.max_connections = 1;
    let engine = Arc::new(PanickingEngine(BuiltinEngine::new()));
    let server = TestServer::start_with(config, engine).await;

    // The panicking connection closes without a response (or is reset).
    let crashed = raw_request(server.addr, b"GET /?game=Panic&dice=1d6 HTTP/1.1\r\n\r\n").await;
    assert!(crashed.map(|raw| raw.is_empty()).unwrap_or(true));

    // The slot was released and the accept loop still runs.
    let next = get(server.addr, "/?game=DiceBot&dice=1d1");
    let raw = tokio::time::timeout(Duration::from_secs(5), next)
        .await
        .expect("server stopped serving after a panic");
    let (status, _, body) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body["body"], "(1D1) ＞ 1");

    server.stop().await;
}

#[tokio::test]
async fn read_timeout_closes_silently() {
    let mut config = local_config();
    config.timeouts.read_secs = Some(1);
    let server = TestServer::start_with(config, Arc::new(BuiltinEngine::new())).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("connection was not closed by the read timeout");
    assert!(read.is_err() || buf.is_empty());
}

#[tokio::test]
async fn oversized_head_is_malformed() {
    let mut config = local_config();
    config.limits.max_head_bytes = 64;
    let server = TestServer::start_with(config, Arc::new(BuiltinEngine::new())).await;

    // One small write arrives as a single segment, so the server buffers all of
    // it before rejecting the head and closes without unread input.
    let request = format!(
        "GET /?game=DiceBot&dice=1d6 HTTP/1.1\r\nX-Pad: {}\r\n\r\n",
        "a".repeat(256)
    );
    let raw = raw_request(server.addr, request.as_bytes())
        .await
        .expect("oversized head was not answered");
    let (status, _, body) = split_response(&raw);
    assert_eq!(status, "HTTP/1.1 400 Bad Request");
    assert_eq!(body["error"], "invalid http request format");
}

#[tokio::test]
async fn works_with_an_http_client() {
    let server = TestServer::start().await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("{}/?game=Emoklore&dice=2DM%3C%3D3", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: serde_json::Value = res.json().await.unwrap();
    let re = Regex::new(r"^\(2DM<=3\) ＞ \[\d+,\d+\] ＞ -?\d+ ＞ .+$").unwrap();
    let text = body["body"].as_str().unwrap();
    assert!(re.is_match(text), "{text}");

    let res = client
        .get(format!("{}/?game=DiceBot&dice=nope", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn stops_while_idle() {
    let server = TestServer::start().await;
    let (status, _, _) = split_response(&get(server.addr, "/?game=DiceBot&dice=1d6").await);
    assert_eq!(status, "HTTP/1.1 200 OK");
    server.stop().await;
}
