//! Integration tests for the WebSocket transport
//!
//! These tests run against a local mock server and verify frame flow and
//! close semantics of the split connection halves.

#[macro_use]
mod common;

use common::{MockWsServer, ServerMode};
use hypersockets::{connect, ConnectOptions, FrameSink, FrameStream, HyperSocketError, WsMessage};
use std::time::Duration;

const STEP: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_send_and_receive_echo() {
    verbose_println!("Testing echo round trip...");

    let server = MockWsServer::start().await;
    let options = ConnectOptions::new(server.ws_url());
    let (mut sink, mut stream) = connect(&options).await.unwrap();

    sink.send(WsMessage::Text("hello".to_string())).await.unwrap();
    let echoed = tokio::time::timeout(STEP, stream.recv()).await.unwrap().unwrap();
    assert_eq!(echoed, WsMessage::Text("hello".to_string()));

    sink.send(WsMessage::Binary(vec![1, 2, 3])).await.unwrap();
    let echoed = tokio::time::timeout(STEP, stream.recv()).await.unwrap().unwrap();
    assert_eq!(echoed, WsMessage::Binary(vec![1, 2, 3]));

    sink.close().await.unwrap();
    verbose_println!("  Echo round trip: OK");
}

#[tokio::test]
async fn test_close_unblocks_pending_read_against_silent_peer() {
    verbose_println!("Testing local close against a silent peer...");

    let server = MockWsServer::start_with_mode(ServerMode::Silent).await;
    let options = ConnectOptions::new(server.ws_url());
    let (mut sink, mut stream) = connect(&options).await.unwrap();

    let reader = tokio::spawn(async move { stream.recv().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!reader.is_finished(), "read should be parked on the socket");

    sink.close().await.unwrap();

    let result = tokio::time::timeout(STEP, reader)
        .await
        .expect("close must unblock the reader")
        .unwrap();
    assert!(matches!(result, Err(HyperSocketError::ConnectionClosed(_))));

    // Idempotent close, refused sends
    sink.close().await.unwrap();
    assert!(sink.send(WsMessage::Text("late".to_string())).await.is_err());
}

#[tokio::test]
async fn test_peer_close_ends_stream() {
    let server = MockWsServer::start_with_mode(ServerMode::CloseImmediately).await;
    let options = ConnectOptions::new(server.ws_url());
    let (_sink, mut stream) = connect(&options).await.unwrap();

    let result = tokio::time::timeout(STEP, stream.recv()).await.unwrap();
    assert!(result.unwrap_err().is_closed());
}

#[tokio::test]
async fn test_oversized_inbound_message_is_an_error() {
    let server = MockWsServer::start().await;
    let options = ConnectOptions::new(server.ws_url()).max_message_size(16);
    let (mut sink, mut stream) = connect(&options).await.unwrap();

    // The echo comes back larger than the limit
    sink.send(WsMessage::Text("x".repeat(64))).await.unwrap();
    let result = tokio::time::timeout(STEP, stream.recv()).await.unwrap();
    assert!(result.is_err());
}

#[tokio::test]
async fn test_connect_refused() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let options = ConnectOptions::new(format!("ws://{}", addr))
        .connect_timeout(Duration::from_secs(2));
    assert!(connect(&options).await.is_err());
}

#[tokio::test]
async fn test_frames_reach_peer_in_send_order() {
    let server = MockWsServer::start_with_mode(ServerMode::Silent).await;
    let options = ConnectOptions::new(server.ws_url());
    let (mut sink, _stream) = connect(&options).await.unwrap();

    for n in 0..5 {
        sink.send(WsMessage::Text(format!("frame-{}", n))).await.unwrap();
    }

    assert!(server.wait_for_frames(5).await);
    let expected: Vec<String> = (0..5).map(|n| format!("frame-{}", n)).collect();
    assert_eq!(server.received(), expected);

    sink.close().await.unwrap();
}
