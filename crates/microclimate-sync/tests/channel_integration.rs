//! Integration tests for the reconnecting live channel against a local
//! WebSocket server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use microclimate_core::SyncConfig;
use microclimate_sync::{ChannelConfig, ChannelState, ChannelMessage, SyncChannel, WeatherEngine};

const RETRY: Duration = Duration::from_millis(100);

/// Behavior of the test server after it has sent its frames.
#[derive(Clone, Copy)]
enum AfterSend {
    KeepOpen,
    Close,
}

/// Spawn a WebSocket server on an ephemeral port. Every accepted
/// connection bumps the counter, receives the given frames, then either
/// stays open or closes.
async fn spawn_server(frames: Vec<String>, after: AfterSend) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = connections.clone();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);

            let frames = frames.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                for frame in &frames {
                    if ws.send(Message::Text(frame.clone())).await.is_err() {
                        return;
                    }
                }
                match after {
                    AfterSend::Close => {
                        let _ = ws.close(None).await;
                    }
                    AfterSend::KeepOpen => while let Some(Ok(_)) = ws.next().await {},
                }
            });
        }
    });

    (format!("ws://{}", addr), connections)
}

/// Poll a condition for up to two seconds.
async fn wait_for(mut cond: impl FnMut() -> bool, what: &str) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

fn snapshot_json(temperature: f64) -> serde_json::Value {
    serde_json::json!({
        "location": {"latitude": 22.2819, "longitude": 114.1577},
        "timestamp": "2026-08-28T08:00:00Z",
        "temperature": temperature,
        "humidity": 75.0,
        "rainfall": 0.0,
        "windSpeed": 2.0,
        "windDirection": 180.0,
        "pressure": 1012.0,
        "uvIndex": 5.0,
        "elevation": 0.0
    })
}

fn weather_update_frame(temperature: f64) -> String {
    serde_json::json!({
        "type": "weather_update",
        "weather": snapshot_json(temperature),
    })
    .to_string()
}

fn grid_update_frame(resolution: u32) -> String {
    serde_json::json!({
        "type": "grid_update",
        "grid": {
            "bounds": {"minLat": 22.27, "maxLat": 22.29, "minLng": 114.15, "maxLng": 114.17},
            "resolution": resolution,
            "data": [{
                "coordinates": {"latitude": 22.28, "longitude": 114.16},
                "weather": snapshot_json(26.0),
                "confidence": 0.9,
                "source": "interpolated"
            }]
        }
    })
    .to_string()
}

fn alert_frame(id: &str) -> String {
    serde_json::json!({
        "type": "alert",
        "alert": {
            "id": id,
            "type": "rainstorm",
            "severity": "warning",
            "title": "Rainstorm",
            "message": "Heavy rain",
            "affectedArea": {
                "type": "point",
                "coordinates": {"latitude": 22.28, "longitude": 114.16}
            },
            "validFrom": "2026-08-28T00:00:00Z",
            "validUntil": "2026-08-28T23:00:00Z"
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_channel_delivers_decoded_messages_and_drops_malformed() {
    let frames = vec![
        weather_update_frame(27.0),
        "{not valid json".to_string(),
        r#"{"type":"unknown_kind","payload":1}"#.to_string(),
        alert_frame("a1"),
    ];
    let (url, _connections) = spawn_server(frames, AfterSend::KeepOpen).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let channel = SyncChannel::new(ChannelConfig::new(url.as_str()).with_retry_delay(RETRY), tx);
    channel.connect();

    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(first, ChannelMessage::WeatherUpdate { .. }));

    // Malformed frames in between were dropped without killing the channel.
    let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(second, ChannelMessage::Alert { alert } if alert.id == "a1"));

    assert_eq!(channel.state(), ChannelState::Connected);
    channel.disconnect().await;
}

#[tokio::test]
async fn test_connect_is_noop_while_live() {
    let (url, connections) = spawn_server(vec![], AfterSend::KeepOpen).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let channel = SyncChannel::new(ChannelConfig::new(url.as_str()).with_retry_delay(RETRY), tx);

    channel.connect();
    wait_for(|| channel.state() == ChannelState::Connected, "connect").await;

    channel.connect();
    channel.connect();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(connections.load(Ordering::SeqCst), 1);
    channel.disconnect().await;
}

#[tokio::test]
async fn test_channel_reconnects_after_remote_close() {
    let (url, connections) = spawn_server(vec![], AfterSend::Close).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let channel = SyncChannel::new(ChannelConfig::new(url.as_str()).with_retry_delay(RETRY), tx);
    channel.connect();

    // The server closes every connection, so the fixed-delay retry
    // should produce a steady stream of fresh connections.
    wait_for(|| connections.load(Ordering::SeqCst) >= 3, "reconnects").await;
    channel.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_suppresses_pending_reconnect() {
    let (url, connections) = spawn_server(vec![], AfterSend::Close).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let channel = SyncChannel::new(ChannelConfig::new(url.as_str()).with_retry_delay(RETRY), tx);
    channel.connect();

    wait_for(|| connections.load(Ordering::SeqCst) >= 1, "first connect").await;
    channel.disconnect().await;
    assert_eq!(channel.state(), ChannelState::Disconnected);

    let settled = connections.load(Ordering::SeqCst);
    // Observe no reconnect for well over twice the retry delay.
    tokio::time::sleep(RETRY * 3).await;
    assert_eq!(connections.load(Ordering::SeqCst), settled);
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let (url, _connections) = spawn_server(vec![], AfterSend::KeepOpen).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let channel = SyncChannel::new(ChannelConfig::new(url.as_str()).with_retry_delay(RETRY), tx);

    channel.disconnect().await;

    channel.connect();
    wait_for(|| channel.state() == ChannelState::Connected, "connect").await;

    channel.disconnect().await;
    channel.disconnect().await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
}

#[tokio::test]
async fn test_engine_applies_channel_messages_and_stop_halts_reconnect() {
    let frames = vec![
        weather_update_frame(26.5),
        grid_update_frame(50),
        alert_frame("live-1"),
    ];
    let (url, connections) = spawn_server(frames, AfterSend::KeepOpen).await;

    let settings = SyncConfig {
        reconnect_secs: 1,
        ..SyncConfig::default()
    };
    let engine = WeatherEngine::new("http://localhost:1", &url, settings);
    engine.start_updates();

    wait_for(
        || {
            let state = engine.state();
            state.current.is_some() && state.grid.is_some() && !state.alerts.is_empty()
        },
        "channel messages applied",
    )
    .await;

    let state = engine.state();
    assert_eq!(state.current.unwrap().temperature, 26.5);
    let grid = state.grid.unwrap();
    assert_eq!(grid.resolution, 50);
    assert_eq!(grid.data.len(), 1);
    assert_eq!(state.alerts[0].id, "live-1");
    assert!(state.last_update.is_some());
    // Channel failures never touch the user-visible error field.
    assert!(state.error.is_none());

    engine.stop_updates().await;
    let settled = connections.load(Ordering::SeqCst);

    // No reconnect within twice the retry delay after stopping.
    tokio::time::sleep(Duration::from_millis(2200)).await;
    assert_eq!(connections.load(Ordering::SeqCst), settled);
    assert_eq!(engine.channel_state(), ChannelState::Disconnected);
}
