//! Weather data model.
//!
//! Field names follow the documented wire contract (camelCase JSON).
//! Snapshots, grids, and profiles are replaced wholesale on update;
//! none of these types is ever partially merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use microclimate_location::Coordinates;

/// Current conditions at a point, replaced wholesale on each update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub location: Coordinates,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub pressure: f64,
    pub uv_index: f64,
    /// Floor level or ground elevation
    pub elevation: f64,
}

/// Rectangular geographic bound of a grid request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Where a grid cell's reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Official,
    Crowdsourced,
    Interpolated,
    #[serde(rename = "ml-predicted")]
    ModelPredicted,
}

/// One interpolated grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub coordinates: Coordinates,
    pub weather: WeatherSnapshot,
    /// 0-1, based on sensor density
    pub confidence: f64,
    pub source: Provenance,
}

/// Spatial grid of interpolated readings, replaced wholesale per fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroclimateGrid {
    pub bounds: GridBounds,
    /// Grid size in meters
    pub resolution: u32,
    pub data: Vec<GridCell>,
}

/// Readings over a contiguous elevation or floor range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherLayer {
    /// [min, max] floor or elevation
    pub elevation_range: (f64, f64),
    pub temperature: f64,
    pub humidity: f64,
    pub visibility: f64,
    pub rainfall: f64,
    pub wind_speed: f64,
}

/// By-floor weather profile.
///
/// Layer ordering is whatever the API returned; the engine does not
/// re-sort it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalWeatherProfile {
    pub location: Coordinates,
    pub timestamp: DateTime<Utc>,
    pub layers: Vec<WeatherLayer>,
}

/// Hazard alert categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Typhoon,
    Rainstorm,
    Heat,
    Cold,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

/// Area an alert applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AffectedArea {
    Point {
        coordinates: Coordinates,
    },
    Radius {
        coordinates: Coordinates,
        /// Meters
        radius: f64,
    },
    Polygon {
        coordinates: Vec<Coordinates>,
    },
}

/// A hazard alert with a validity window.
///
/// Alerts are keyed by id but the engine does not deduplicate; ids
/// colliding over the live channel accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub affected_area: AffectedArea,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

/// Inbound live-channel message, tagged by kind.
///
/// Each kind maps to exactly one mutation of the engine's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    WeatherUpdate { weather: WeatherSnapshot },
    GridUpdate { grid: MicroclimateGrid },
    Alert { alert: Alert },
}
