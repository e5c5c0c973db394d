//! Tests for the reqwest transport against a local socket fixture.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lbclient::http::{HttpClient, Method, Request, TimeoutConfig};
use lbclient::{BalancedCallExecutor, BalancedRequest, ClientConfig, ClientError, ReqwestClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

const OK_RESPONSE: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello";
const NO_CONTENT_RESPONSE: &str = "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n";
const UNAVAILABLE_RESPONSE: &str =
    "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\nbusy";

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = vec![0u8; 8192];
    let mut read = 0;
    loop {
        let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        read += n;
        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
            break;
        }
    }
    String::from_utf8_lossy(&buf[..read]).into_owned()
}

/// Answer a single connection with `response`, reporting the request head.
async fn serve_once(response: &'static str) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let head = read_head(&mut socket).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            let _ = tx.send(head);
        }
    });
    (addr, rx)
}

/// Accept a connection and never answer.
async fn serve_stalled() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        }
    });
    addr
}

async fn unused_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn transport() -> ReqwestClient {
    ReqwestClient::new(Duration::from_secs(2)).unwrap()
}

fn timeouts() -> TimeoutConfig {
    TimeoutConfig::new(2_000, 2_000)
}

// ============================================================================
// Transport Tests
// ============================================================================

#[tokio::test]
async fn test_ok_response_with_body() {
    let (addr, head) = serve_once(OK_RESPONSE).await;
    let request = Request::new(Method::GET, &format!("http://{}/greeting", addr))
        .unwrap()
        .header("X-Trace", "abc");

    let mut response = transport().execute(&request, &timeouts()).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.reason(), Some("OK"));
    assert_eq!(response.headers().first("content-type"), Some("text/plain"));

    let body = response.body_mut().unwrap();
    assert_eq!(body.length(), Some(5));
    assert_eq!(body.text().await.unwrap(), "hello");
    assert!(body.is_closed());

    let head = head.await.unwrap().to_lowercase();
    assert!(head.starts_with("get /greeting"));
    assert!(head.contains("x-trace: abc"));
}

#[tokio::test]
async fn test_no_content_has_no_body() {
    let (addr, _head) = serve_once(NO_CONTENT_RESPONSE).await;
    let request = Request::new(Method::DELETE, &format!("http://{}/items/1", addr)).unwrap();

    let response = transport().execute(&request, &timeouts()).await.unwrap();
    assert_eq!(response.status(), 204);
    assert!(response.body().is_none());
}

#[tokio::test]
async fn test_head_has_no_body() {
    let (addr, _head) = serve_once(OK_RESPONSE).await;
    let request = Request::new(Method::HEAD, &format!("http://{}/greeting", addr)).unwrap();

    let response = transport().execute(&request, &timeouts()).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.body().is_none());
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let (addr, _head) = serve_once(UNAVAILABLE_RESPONSE).await;
    let request = Request::new(Method::GET, &format!("http://{}/greeting", addr)).unwrap();

    let mut response = transport().execute(&request, &timeouts()).await.unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(response.body_mut().unwrap().text().await.unwrap(), "busy");
}

#[tokio::test]
async fn test_connection_refused_is_retriable() {
    let addr = unused_port().await;
    let request = Request::new(Method::GET, &format!("http://{}/greeting", addr)).unwrap();

    let err = transport().execute(&request, &timeouts()).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn test_stalled_server_times_out() {
    let addr = serve_stalled().await;
    let request = Request::new(Method::GET, &format!("http://{}/greeting", addr)).unwrap();

    let err = transport()
        .execute(&request, &TimeoutConfig::new(50, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout(after) if after == Duration::from_millis(150)));
    assert!(err.is_retriable());
}

// ============================================================================
// End-to-end Tests
// ============================================================================

#[tokio::test]
async fn test_balanced_call_over_real_socket() {
    let (addr, head) = serve_once(OK_RESPONSE).await;
    let mut config = ClientConfig::new("greeter");
    config.servers = vec![addr.to_string()];

    let transport = Arc::new(ReqwestClient::from_config(&config).unwrap());
    let executor = BalancedCallExecutor::from_config(config).unwrap();
    let request = Request::new(Method::GET, "http://greeter/greeting?lang=en").unwrap();

    let mut response = executor
        .execute_with_load_balancer(BalancedRequest::new(transport, request), None)
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(
        response.requested_uri().as_str(),
        format!("http://{}/greeting?lang=en", addr)
    );
    assert_eq!(response.payload_mut().unwrap().text().await.unwrap(), "hello");
    assert!(head.await.unwrap().starts_with("GET /greeting?lang=en"));
}

#[tokio::test]
async fn test_balanced_call_skips_dead_server() {
    let dead = unused_port().await;
    let (alive, _head) = serve_once(OK_RESPONSE).await;
    let mut config = ClientConfig::new("greeter");
    config.servers = vec![dead.to_string(), alive.to_string()];

    let transport = Arc::new(ReqwestClient::from_config(&config).unwrap());
    let executor = BalancedCallExecutor::from_config(config).unwrap();
    let request = Request::new(Method::GET, "http://greeter/greeting").unwrap();

    let response = executor
        .execute_with_load_balancer(BalancedRequest::new(transport, request), None)
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.requested_uri().port(), Some(alive.port()));
}

#[tokio::test]
async fn test_unbuildable_request_is_not_retried() {
    let first = unused_port().await;
    let second = unused_port().await;
    let mut config = ClientConfig::new("greeter");
    config.servers = vec![first.to_string(), second.to_string()];

    let transport = Arc::new(ReqwestClient::from_config(&config).unwrap());
    let executor = BalancedCallExecutor::from_config(config).unwrap();
    let request = Request::new(Method::GET, "http://greeter/greeting")
        .unwrap()
        .header("bad header", "x");

    let err = executor
        .execute_with_load_balancer(BalancedRequest::new(transport, request), None)
        .await
        .unwrap_err();

    match &err {
        ClientError::Transport(e) => assert!(e.is_builder()),
        other => panic!("expected a transport error, got {:?}", other),
    }
    for stats in executor.load_balancer().stats() {
        assert_eq!(stats.error_count, 0);
        assert_eq!(stats.request_count, 0);
        assert_eq!(stats.active_requests, 0);
    }
}
