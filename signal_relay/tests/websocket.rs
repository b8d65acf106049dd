//! End-to-end signaling over real WebSocket connections

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use signal_relay::{AppState, Registry, SignalingRouter, serve};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> (SocketAddr, Registry) {
    start_server_with(64 * 1024).await
}

async fn start_server_with(max_message_bytes: usize) -> (SocketAddr, Registry) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let registry = Registry::new();
    let state = AppState {
        router: SignalingRouter::new(registry.clone()),
        max_message_bytes,
        outbox_capacity: 16,
    };
    tokio::spawn(serve(listener, state, std::future::pending()));
    (addr, registry)
}

/// Plain HTTP/1.1 GET, returning the status code and body
async fn http_get(addr: SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    timeout(Duration::from_secs(5), stream.read_to_string(&mut response))
        .await
        .expect("timed out waiting for response")
        .unwrap();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("missing status code");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

async fn recv(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(ws: &mut Client) {
    assert!(
        timeout(Duration::from_millis(200), ws.next()).await.is_err(),
        "expected no message"
    );
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn alice_calls_bob_then_hangs_up() {
    let (addr, registry) = start_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    send(&mut a, json!({"type": "login", "name": "alice"})).await;
    assert_eq!(recv(&mut a).await, json!({"type": "login", "success": true}));

    send(&mut b, json!({"type": "login", "name": "alice"})).await;
    assert_eq!(recv(&mut b).await, json!({"type": "login", "success": false}));

    send(&mut b, json!({"type": "login", "name": "bob"})).await;
    assert_eq!(recv(&mut b).await, json!({"type": "login", "success": true}));

    let offer = json!({"type": "offer", "sdp": "v=0\r\n"});
    send(&mut a, json!({"type": "offer", "name": "bob", "offer": offer.clone()})).await;
    assert_eq!(
        recv(&mut b).await,
        json!({"type": "offer", "offer": offer, "name": "alice"})
    );

    let answer = json!({"type": "answer", "sdp": "v=0\r\n"});
    send(&mut b, json!({"type": "answer", "name": "alice", "answer": answer.clone()})).await;
    assert_eq!(recv(&mut a).await, json!({"type": "answer", "answer": answer}));

    let candidate = json!({"candidate": "candidate:0 1 UDP 2122252543 192.0.2.1 54400 typ host"});
    send(&mut b, json!({"type": "candidate", "name": "alice", "candidate": candidate.clone()})).await;
    assert_eq!(
        recv(&mut a).await,
        json!({"type": "candidate", "candidate": candidate})
    );

    a.close(None).await.unwrap();
    assert_eq!(recv(&mut b).await, json!({"type": "leave"}));
    wait_until(|| registry.lookup("alice").is_none()).await;
    assert_eq!(registry.peer_of("bob"), None);
    assert!(registry.lookup("bob").is_some());
}

#[tokio::test]
async fn bad_requests_get_error_replies() {
    let (addr, _registry) = start_server().await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "dance"})).await;
    assert_eq!(
        recv(&mut ws).await,
        json!({"type": "error", "message": "Command not found: dance"})
    );

    ws.send(Message::text("this is not json")).await.unwrap();
    assert_eq!(
        recv(&mut ws).await,
        json!({"type": "error", "message": "Command not found: undefined"})
    );

    // Connection is still usable
    send(&mut ws, json!({"type": "login", "name": "carol"})).await;
    assert_eq!(recv(&mut ws).await, json!({"type": "login", "success": true}));
}

#[tokio::test]
async fn unknown_target_is_dropped_silently() {
    let (addr, _registry) = start_server().await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "login", "name": "dave"})).await;
    recv(&mut ws).await;

    send(&mut ws, json!({"type": "offer", "name": "nobody", "offer": {}})).await;
    send(&mut ws, json!({"type": "leave", "name": "nobody"})).await;
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn name_is_free_after_disconnect() {
    let (addr, registry) = start_server().await;

    let mut first = connect(addr).await;
    send(&mut first, json!({"type": "login", "name": "erin"})).await;
    assert_eq!(recv(&mut first).await, json!({"type": "login", "success": true}));
    drop(first);

    wait_until(|| registry.lookup("erin").is_none()).await;

    let mut second = connect(addr).await;
    send(&mut second, json!({"type": "login", "name": "erin"})).await;
    assert_eq!(recv(&mut second).await, json!({"type": "login", "success": true}));
}

#[tokio::test]
async fn concurrent_logins_for_one_name() {
    let (addr, registry) = start_server().await;

    let attempts = (0..8).map(|_| async move {
        let mut ws = connect(addr).await;
        send(&mut ws, json!({"type": "login", "name": "frank"})).await;
        let reply = recv(&mut ws).await;
        (ws, reply["success"] == true)
    });
    let results = futures_util::future::join_all(attempts).await;

    let winners = results.iter().filter(|(_, won)| *won).count();
    assert_eq!(winners, 1);
    assert!(registry.lookup("frank").is_some());
}

#[tokio::test]
async fn http_routes() {
    let (addr, _registry) = start_server().await;

    let (status, body) = http_get(addr, "/").await;
    assert_eq!(status, 200);
    assert!(body.contains("/ws"), "banner should list endpoints: {body}");

    assert_eq!(http_get(addr, "/health").await, (200, "OK".to_string()));
    assert_eq!(http_get(addr, "/nope").await, (404, "Not Found".to_string()));
}

#[tokio::test]
async fn oversized_frame_ends_connection() {
    let (addr, registry) = start_server_with(1024).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "login", "name": "gina"})).await;
    assert_eq!(recv(&mut ws).await, json!({"type": "login", "success": true}));

    let big = json!({"type": "offer", "name": "gina", "offer": "x".repeat(4096)});
    // The server may already be gone by the time the write is flushed
    let _ = ws.send(Message::text(big.to_string())).await;

    loop {
        match timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("connection was not closed")
        {
            Some(Ok(Message::Text(text))) => panic!("unexpected message: {}", text.as_str()),
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
            Some(Ok(_)) => {}
        }
    }
    wait_until(|| registry.lookup("gina").is_none()).await;
}

#[tokio::test]
async fn client_close_completes_handshake() {
    let (addr, registry) = start_server().await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({"type": "login", "name": "hana"})).await;
    recv(&mut ws).await;

    ws.close(None).await.unwrap();
    loop {
        match timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("close handshake did not finish")
        {
            Some(Ok(_)) => {}
            Some(Err(err)) => panic!("connection reset instead of closing: {err}"),
            None => break,
        }
    }
    wait_until(|| registry.lookup("hana").is_none()).await;
}
