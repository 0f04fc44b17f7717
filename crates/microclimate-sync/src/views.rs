//! Derived read-only views over the engine state.
//!
//! Pure projections with no storage of their own; callers re-evaluate
//! them whenever the canonical state changes. Active alerts are
//! computed lazily against "now", so an alert can enter or leave the
//! active set purely through elapsed time.

use chrono::{DateTime, Utc};

use crate::engine::WeatherState;
use crate::types::Alert;

/// Temperature from the current snapshot, if any.
pub fn temperature(state: &WeatherState) -> Option<f64> {
    state.current.as_ref().map(|w| w.temperature)
}

/// Humidity from the current snapshot, if any.
pub fn humidity(state: &WeatherState) -> Option<f64> {
    state.current.as_ref().map(|w| w.humidity)
}

/// Rainfall from the current snapshot, if any.
pub fn rainfall(state: &WeatherState) -> Option<f64> {
    state.current.as_ref().map(|w| w.rainfall)
}

/// Alerts whose validity window contains the given instant, inclusive
/// on both ends.
pub fn active_alerts(state: &WeatherState, now: DateTime<Utc>) -> Vec<Alert> {
    state
        .alerts
        .iter()
        .filter(|alert| alert.valid_from <= now && now <= alert.valid_until)
        .cloned()
        .collect()
}

/// Alerts active at the moment of the call.
pub fn active_alerts_now(state: &WeatherState) -> Vec<Alert> {
    active_alerts(state, Utc::now())
}
