//! Weather API client.
//!
//! Thin wrapper over the request/response endpoints. Non-2xx responses
//! are treated uniformly as failure regardless of body content.

use tracing::instrument;

use crate::error::SyncError;
use crate::types::{Alert, GridBounds, MicroclimateGrid, VerticalWeatherProfile, WeatherSnapshot};

pub struct WeatherApi {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET /api/weather/current?lat&lng&elevation?`
    #[instrument(skip(self), level = "info")]
    pub async fn current_weather(
        &self,
        lat: f64,
        lng: f64,
        elevation: Option<f64>,
    ) -> Result<WeatherSnapshot, SyncError> {
        let mut url = format!(
            "{}/api/weather/current?lat={}&lng={}",
            self.base_url, lat, lng
        );
        if let Some(elevation) = elevation {
            url.push_str(&format!("&elevation={}", elevation));
        }

        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    /// `POST /api/weather/grid` with `{bounds, resolution}`
    #[instrument(skip(self), level = "info")]
    pub async fn grid(
        &self,
        bounds: &GridBounds,
        resolution: u32,
    ) -> Result<MicroclimateGrid, SyncError> {
        let url = format!("{}/api/weather/grid", self.base_url);
        let body = serde_json::json!({
            "bounds": bounds,
            "resolution": resolution,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        Self::handle_response(response).await
    }

    /// `GET /api/weather/vertical?lat&lng&maxFloor`
    #[instrument(skip(self), level = "info")]
    pub async fn vertical_profile(
        &self,
        lat: f64,
        lng: f64,
        max_floor: u32,
    ) -> Result<VerticalWeatherProfile, SyncError> {
        let url = format!(
            "{}/api/weather/vertical?lat={}&lng={}&maxFloor={}",
            self.base_url, lat, lng, max_floor
        );

        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    /// `GET /api/alerts?lat&lng&radius`
    #[instrument(skip(self), level = "info")]
    pub async fn alerts(&self, lat: f64, lng: f64, radius: u32) -> Result<Vec<Alert>, SyncError> {
        let url = format!(
            "{}/api/alerts?lat={}&lng={}&radius={}",
            self.base_url, lat, lng, radius
        );

        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SyncError> {
        let status = response.status();

        if !status.is_success() {
            return Err(SyncError::Api(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }
}
