//! Shared fixtures for the transport integration tests
//!
//! [`MockWsServer`] accepts any number of WebSocket upgrades on a loopback
//! port and drives each one with the behaviour picked by [`ServerMode`].
//! Every text frame it reads is recorded so tests can assert on what the
//! client actually put on the wire.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// Send every data frame straight back
    Echo,
    /// Read and record, never write (no close either)
    Silent,
    /// Close right after the upgrade
    CloseImmediately,
}

type Socket = WebSocketStream<TcpStream>;
type Recorded = Arc<Mutex<Vec<String>>>;

pub struct MockWsServer {
    pub addr: SocketAddr,
    recorded: Recorded,
    acceptor: JoinHandle<()>,
}

impl MockWsServer {
    pub async fn start() -> Self {
        Self::start_with_mode(ServerMode::Echo).await
    }

    pub async fn start_with_mode(mode: ServerMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded: Recorded = Arc::default();

        let sessions = Arc::clone(&recorded);
        let acceptor = tokio::spawn(async move {
            while let Ok((tcp, peer)) = listener.accept().await {
                verbose_println!("  mock accepted {}", peer);
                let recorded = Arc::clone(&sessions);
                tokio::spawn(async move {
                    match tokio_tungstenite::accept_async(tcp).await {
                        Ok(socket) => serve(socket, mode, recorded).await,
                        Err(e) => eprintln!("upgrade from {} failed: {}", peer, e),
                    }
                });
            }
        });

        Self {
            addr,
            recorded,
            acceptor,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Text frames read so far, across all connections
    pub fn received(&self) -> Vec<String> {
        self.recorded.lock().clone()
    }

    /// Poll until `count` text frames have arrived or two seconds pass
    pub async fn wait_for_frames(&self, count: usize) -> bool {
        for _ in 0..200 {
            if self.recorded.lock().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

async fn serve(mut socket: Socket, mode: ServerMode, recorded: Recorded) {
    if mode == ServerMode::CloseImmediately {
        let _ = socket.close(None).await;
        return;
    }

    while let Some(Ok(frame)) = socket.next().await {
        let reply = match frame {
            Message::Text(text) => {
                recorded.lock().push(text.clone());
                Message::Text(text)
            }
            Message::Binary(bytes) => Message::Binary(bytes),
            Message::Close(_) => break,
            _ => continue,
        };
        if mode == ServerMode::Echo && socket.send(reply).await.is_err() {
            break;
        }
    }
}
