use std::sync::Arc;

use anyhow::{Context, Result};

use microclimate_core::{Config, FileStore};
use microclimate_location::{LocationProvider, NoPositioning};
use microclimate_sync::{views, WeatherEngine};

#[tokio::main]
async fn main() -> Result<()> {
    microclimate_core::init()?;

    let (config, _validation) = Config::load_validated()?;

    let store = Arc::new(FileStore::new(config.config_dir.join("store")));
    let location = LocationProvider::new(store, Arc::new(NoPositioning));
    location.initialize().await?;
    location.load_saved_locations()?;

    if let Some(notice) = location.error() {
        tracing::warn!("{}", notice);
    }

    let coords = location.current().context("no location resolved")?;
    tracing::info!(
        latitude = coords.latitude,
        longitude = coords.longitude,
        "observer location resolved"
    );

    let engine = WeatherEngine::new(&config.api_base_url, &config.channel_url, config.sync.clone());

    engine
        .fetch_current_weather(coords.latitude, coords.longitude, coords.elevation)
        .await;
    engine.fetch_alerts(coords.latitude, coords.longitude, None).await;
    engine.start_updates();

    let state = engine.state();
    if let Some(error) = &state.error {
        tracing::warn!("initial weather fetch failed: {}", error);
    } else if let Some(temperature) = views::temperature(&state) {
        println!("Current temperature: {:.1} C", temperature);
    }
    for alert in views::active_alerts_now(&state) {
        println!("Active alert [{:?}]: {}", alert.severity, alert.title);
    }

    tracing::info!("Microclimate client running, Ctrl-C to exit");
    tokio::signal::ctrl_c().await?;

    engine.stop_updates().await;
    tracing::info!("shut down cleanly");

    Ok(())
}
