//! Live trades and order book from a Pusher feed
//!
//! Subscribes to the given channels (default `live_trades` and `order_book`)
//! and logs every `trade` and `data` event. When the connection fails the
//! session is torn down and a new one is opened.
//!
//! ```text
//! PUSHER_APP_KEY=de504dc5763aeef9ff52 cargo run --bin live_trades -- live_trades order_book
//! ```

use anyhow::{bail, Result};
use crossbeam_channel::select;
use pusher_feed::bin_common::{
    app_key_from_env, init_tracing, load_client_config, load_config_from_env, parse_args,
    ConfigType, ShutdownManager,
};
use pusher_feed::pusher::{ClientConfig, EventQueue, PusherClient, ERR_EVENT};
use std::time::Duration;
use tracing::{error, info, warn};

const DEFAULT_CHANNELS: [&str; 2] = ["live_trades", "order_book"];
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config_path = load_config_from_env(ConfigType::Client);
    let config = load_client_config(&config_path)?;
    let app_key = app_key_from_env();

    let mut channels = parse_args();
    if channels.is_empty() {
        channels = DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect();
    }

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    info!("Starting live_trades on {} ({:?})", config.host, channels);
    info!("Press Ctrl+C to stop");

    while shutdown.is_running() {
        match run_session(&app_key, config.clone(), &channels, &shutdown).await {
            Ok(()) => break,
            Err(e) => error!("Session ended: {:#}", e),
        }
        if shutdown.is_running() {
            info!("Reconnecting in {:?}", RECONNECT_DELAY);
        }
        if !shutdown.reconnect_pause(RECONNECT_DELAY).await {
            break;
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// One connection, from handshake to close
///
/// Returns `Ok` when shutdown was requested and `Err` when the connection
/// failed and should be replaced.
async fn run_session(
    app_key: &str,
    config: ClientConfig,
    channels: &[String],
    shutdown: &ShutdownManager,
) -> Result<()> {
    let client = PusherClient::connect_with_config(app_key, config).await?;

    let books = client.bind("data")?;
    let trades = client.bind("trade")?;
    let failures = client.bind(ERR_EVENT)?;

    for channel in channels {
        if let Err(e) = client.subscribe(channel).await {
            warn!("Subscription error on {}: {}", channel, e);
        }
    }

    let running = shutdown.clone();
    let outcome =
        tokio::task::spawn_blocking(move || consume(&books, &trades, &failures, &running)).await?;

    if let Err(e) = client.close().await {
        warn!("Close failed: {}", e);
    }
    info!("Session metrics: {:?}", client.metrics());
    outcome
}

fn consume(
    books: &EventQueue,
    trades: &EventQueue,
    failures: &EventQueue,
    shutdown: &ShutdownManager,
) -> Result<()> {
    while shutdown.is_running() {
        select! {
            recv(books) -> event => match event {
                Ok(event) => info!("ORDER BOOK: {}", event.data),
                Err(_) => bail!("order book queue closed"),
            },
            recv(trades) -> event => match event {
                Ok(event) => info!("TRADE: {}", event.data),
                Err(_) => bail!("trade queue closed"),
            },
            recv(failures) -> event => {
                let reason = event.map(|e| e.data).unwrap_or_default();
                bail!("transport error: {}", reason);
            },
            default(POLL_INTERVAL) => {}
        }
    }
    Ok(())
}
