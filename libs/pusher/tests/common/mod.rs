//! Common test utilities for Pusher client integration tests
//!
//! A mock broker that plays a scripted handshake, records every frame the
//! client sends and pushes frames on demand.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

pub const ESTABLISHED: &str =
    r#"{"event":"pusher:connection_established","data":"{\"socket_id\":\"1234.5678\",\"activity_timeout\":120}"}"#;
pub const PING: &str = r#"{"event":"pusher:ping","data":"{}"}"#;
pub const PONG: &str = r#"{"event":"pusher:pong","data":"{}"}"#;

/// First frame the broker sends after the upgrade
#[derive(Debug, Clone)]
pub enum Handshake {
    Accept,
    Reject { code: i64, message: String },
    /// Send this frame verbatim
    Raw(String),
    /// Send nothing
    Silent,
}

impl Handshake {
    fn frame(&self) -> Option<String> {
        match self {
            Handshake::Accept => Some(ESTABLISHED.to_string()),
            Handshake::Reject { code, message } => Some(
                serde_json::json!({
                    "event": "pusher:error",
                    "data": {"message": message, "code": code}
                })
                .to_string(),
            ),
            Handshake::Raw(frame) => Some(frame.clone()),
            Handshake::Silent => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Command {
    Frame(String),
    Close,
}

/// Mock Pusher broker
pub struct MockPusherServer {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    paths: Arc<Mutex<Vec<String>>>,
    commands: broadcast::Sender<Command>,
    shutdown: Arc<Notify>,
}

impl MockPusherServer {
    pub async fn start() -> Self {
        Self::start_with(Handshake::Accept).await
    }

    pub async fn start_with(handshake: Handshake) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let paths = Arc::new(Mutex::new(Vec::new()));
        let (commands, _) = broadcast::channel(64);
        let shutdown = Arc::new(Notify::new());

        {
            let received = Arc::clone(&received);
            let paths = Arc::clone(&paths);
            let commands = commands.clone();
            let shutdown = Arc::clone(&shutdown);

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        result = listener.accept() => {
                            match result {
                                Ok((stream, _)) => {
                                    let connection = Connection {
                                        handshake: handshake.clone(),
                                        received: Arc::clone(&received),
                                        paths: Arc::clone(&paths),
                                        commands: commands.subscribe(),
                                        shutdown: Arc::clone(&shutdown),
                                    };
                                    tokio::spawn(connection.run(stream));
                                }
                                Err(e) => {
                                    eprintln!("Accept error: {}", e);
                                    break;
                                }
                            }
                        }
                        _ = shutdown.notified() => break,
                    }
                }
            });
        }

        Self {
            addr,
            received,
            paths,
            commands,
            shutdown,
        }
    }

    /// Host part for `connect_custom`
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Push a frame to every connected client
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.commands.send(Command::Frame(frame.into()));
    }

    /// Close every connection from the broker side
    pub fn disconnect_all(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Every text frame received so far
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Received frames other than heartbeat pings
    pub fn received_without_pings(&self) -> Vec<String> {
        self.received().into_iter().filter(|f| f != PING).collect()
    }

    /// Request paths (with query) of the accepted upgrades
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }

    /// Wait until a received frame equals `frame`
    pub async fn wait_for_frame(&self, frame: &str) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while tokio::time::Instant::now() < deadline {
            if self.received.lock().iter().any(|f| f == frame) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockPusherServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Connection {
    handshake: Handshake,
    received: Arc<Mutex<Vec<String>>>,
    paths: Arc<Mutex<Vec<String>>>,
    commands: broadcast::Receiver<Command>,
    shutdown: Arc<Notify>,
}

impl Connection {
    async fn run(mut self, stream: tokio::net::TcpStream) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_hdr_async;
        use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
        use tokio_tungstenite::tungstenite::Message;

        let paths = Arc::clone(&self.paths);
        let record_path = move |request: &Request,
                                response: Response|
              -> Result<Response, ErrorResponse> {
            paths.lock().push(request.uri().to_string());
            Ok(response)
        };

        let ws_stream = match accept_hdr_async(stream, record_path).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };
        let (mut write, mut read) = ws_stream.split();

        if let Some(frame) = self.handshake.frame() {
            if write.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            verbose_println!("  broker <- {}", text);
                            self.received.lock().push(text);
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                command = self.commands.recv() => {
                    match command {
                        Ok(Command::Frame(frame)) => {
                            if write.send(Message::Text(frame)).await.is_err() {
                                break;
                            }
                        }
                        Ok(Command::Close) => {
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = self.shutdown.notified() => break,
            }
        }
    }
}
