//! Weather-state synchronization for Microclimate.
//!
//! Maintains a consistent in-memory weather snapshot against an
//! unreliable network: request/response fetches, a reconnecting live
//! channel, a fallback health timer, and derived read-only views.

pub mod channel;
pub mod client;
pub mod engine;
pub mod error;
pub mod types;
pub mod views;

pub use channel::{ChannelConfig, ChannelState, ChannelStateHandle, SyncChannel};
pub use client::WeatherApi;
pub use engine::{WeatherEngine, WeatherState};
pub use error::SyncError;
pub use types::{
    AffectedArea, Alert, AlertKind, ChannelMessage, GridBounds, GridCell, MicroclimateGrid,
    Provenance, Severity, WeatherLayer, WeatherSnapshot, VerticalWeatherProfile,
};
