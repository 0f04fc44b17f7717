use serde::{Deserialize, Serialize};

/// Geographic position of the observer.
///
/// Elevation is meters above sea level or a floor index, depending on
/// context. Latitude/longitude ranges are not validated; the engine
/// passes whatever the caller supplies straight to the API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
        }
    }

    /// Return a copy with the elevation replaced.
    pub fn with_elevation(self, elevation: f64) -> Self {
        Self {
            elevation: Some(elevation),
            ..self
        }
    }
}

/// A user-saved location entry.
///
/// Ids are caller-supplied; the provider does not check uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
}
