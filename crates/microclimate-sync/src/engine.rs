//! Weather synchronization engine.
//!
//! Owns the canonical weather state and keeps it consistent against an
//! unreliable network: a primary snapshot fetch whose failures surface
//! in state, best-effort grid/profile/alert fetches whose failures only
//! reach the logs, a live channel whose messages mutate state, and a
//! fallback timer that checks channel health.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use microclimate_core::SyncConfig;

use crate::channel::{ChannelConfig, ChannelState, ChannelStateHandle, SyncChannel};
use crate::client::WeatherApi;
use crate::types::{
    Alert, ChannelMessage, GridBounds, MicroclimateGrid, VerticalWeatherProfile, WeatherSnapshot,
};

/// Canonical weather state. Snapshot, grid, and profile are replaced
/// wholesale; alerts accumulate from the channel and are replaced
/// wholesale by `fetch_alerts`.
#[derive(Debug, Clone, Default)]
pub struct WeatherState {
    pub current: Option<WeatherSnapshot>,
    pub grid: Option<MicroclimateGrid>,
    pub vertical_profile: Option<VerticalWeatherProfile>,
    pub alerts: Vec<Alert>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

struct UpdateTimer {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Owns all weather-related state and the resources that feed it.
pub struct WeatherEngine {
    api: WeatherApi,
    channel: SyncChannel,
    settings: SyncConfig,
    state: Arc<RwLock<WeatherState>>,
    inbox: Mutex<Option<mpsc::UnboundedReceiver<ChannelMessage>>>,
    timer: Mutex<Option<UpdateTimer>>,
}

impl WeatherEngine {
    pub fn new(api_base_url: &str, channel_url: &str, settings: SyncConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel_config = ChannelConfig::new(channel_url)
            .with_retry_delay(Duration::from_secs(settings.reconnect_secs));

        Self {
            api: WeatherApi::new(api_base_url),
            channel: SyncChannel::new(channel_config, tx),
            settings,
            state: Arc::new(RwLock::new(WeatherState::default())),
            inbox: Mutex::new(Some(rx)),
            timer: Mutex::new(None),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WeatherState {
        self.state.read().clone()
    }

    /// Current live-channel state.
    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    /// Fetch the primary snapshot.
    ///
    /// On success the snapshot is replaced and the update time stamped;
    /// on any failure the prior snapshot is left intact and a
    /// human-readable error is surfaced in state.
    pub async fn fetch_current_weather(&self, lat: f64, lng: f64, elevation: Option<f64>) {
        {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
        }

        match self.api.current_weather(lat, lng, elevation).await {
            Ok(snapshot) => {
                let mut state = self.state.write();
                state.current = Some(snapshot);
                state.loading = false;
                state.last_update = Some(Utc::now());
            }
            Err(e) => {
                warn!("current weather fetch failed: {}", e);
                let mut state = self.state.write();
                state.loading = false;
                state.error = Some(e.user_message());
            }
        }
    }

    /// Fetch the interpolated grid for a rectangular bound.
    ///
    /// Best-effort: failures are logged and the grid stays stale.
    pub async fn fetch_grid(&self, bounds: GridBounds) {
        match self.api.grid(&bounds, self.settings.grid_resolution_m).await {
            Ok(grid) => {
                self.state.write().grid = Some(grid);
            }
            Err(e) => {
                warn!("grid fetch failed: {}", e);
            }
        }
    }

    /// Fetch the by-floor vertical profile. Best-effort.
    pub async fn fetch_vertical_profile(&self, lat: f64, lng: f64, max_floor: Option<u32>) {
        let max_floor = max_floor.unwrap_or(self.settings.max_floor);

        match self.api.vertical_profile(lat, lng, max_floor).await {
            Ok(profile) => {
                self.state.write().vertical_profile = Some(profile);
            }
            Err(e) => {
                warn!("vertical profile fetch failed: {}", e);
            }
        }
    }

    /// Fetch active alerts around a point, replacing the entire alert
    /// set on success. Best-effort.
    pub async fn fetch_alerts(&self, lat: f64, lng: f64, radius: Option<u32>) {
        let radius = radius.unwrap_or(self.settings.alert_radius_m);

        match self.api.alerts(lat, lng, radius).await {
            Ok(alerts) => {
                self.state.write().alerts = alerts;
            }
            Err(e) => {
                warn!("alerts fetch failed: {}", e);
            }
        }
    }

    /// Open the live channel and start the fallback health timer.
    ///
    /// The timer only logs when the channel is down; refetch triggers
    /// are left to the caller.
    pub fn start_updates(&self) {
        // The apply loop is spawned once for the engine's lifetime; it
        // ends when the channel's message sender is dropped.
        if let Some(inbox) = self.inbox.lock().take() {
            tokio::spawn(apply_messages(inbox, self.state.clone()));
        }

        self.channel.connect();

        let mut timer = self.timer.lock();
        if timer.is_none() {
            let cancel = CancellationToken::new();
            let task = tokio::spawn(fallback_timer(
                self.channel.state_handle(),
                self.fallback_period(),
                cancel.clone(),
            ));
            *timer = Some(UpdateTimer { task, cancel });
        }
    }

    /// Disconnect the channel and cancel the fallback timer. Idempotent.
    ///
    /// In-flight fetches are not aborted; only future scheduling stops.
    pub async fn stop_updates(&self) {
        self.channel.disconnect().await;

        let timer = self.timer.lock().take();
        if let Some(UpdateTimer { task, cancel }) = timer {
            cancel.cancel();
            let _ = task.await;
        }
    }

    /// Clear the error field only; data and loading are untouched.
    pub fn clear_error(&self) {
        self.state.write().error = None;
    }

    /// `interval` panics on a zero period, so a zero setting is clamped
    /// to one second.
    fn fallback_period(&self) -> Duration {
        Duration::from_secs(self.settings.fallback_poll_secs.max(1))
    }
}

/// Apply inbound channel messages to the canonical state. Each message
/// kind maps to exactly one mutation.
async fn apply_messages(
    mut inbox: mpsc::UnboundedReceiver<ChannelMessage>,
    state: Arc<RwLock<WeatherState>>,
) {
    while let Some(msg) = inbox.recv().await {
        let mut state = state.write();
        match msg {
            ChannelMessage::WeatherUpdate { weather } => {
                state.current = Some(weather);
                state.last_update = Some(Utc::now());
            }
            ChannelMessage::GridUpdate { grid } => {
                state.grid = Some(grid);
            }
            ChannelMessage::Alert { alert } => {
                state.alerts.push(alert);
            }
        }
    }
}

/// Periodic channel-health check. Logs a fallback notice when the live
/// channel is not connected; does not itself refetch anything.
async fn fallback_timer(
    channel: ChannelStateHandle,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {
                if !channel.get().is_connected() {
                    info!("live channel down, falling back to polling");
                }
            }
        }
    }
}
