//! Location provider.
//!
//! Owns the current coordinates and the saved-location list. Restores
//! from the durable store on startup, falls back to a single OS fix,
//! and finally to a fixed default (Central, Hong Kong).

use std::sync::Arc;

use parking_lot::RwLock;

use microclimate_core::{KeyValueStore, StorageError};

use crate::positioning::PositioningSource;
use crate::types::{Coordinates, SavedLocation};

const LOCATION_KEY: &str = "microclimate_location";
const SAVED_LOCATIONS_KEY: &str = "microclimate_saved_locations";

const DEFAULT_LATITUDE: f64 = 22.2819;
const DEFAULT_LONGITUDE: f64 = 114.1577;
const DEFAULT_LOCATION_NOTICE: &str = "Using default location (Central, HK)";

#[derive(Debug, Default)]
struct LocationState {
    current: Option<Coordinates>,
    saved: Vec<SavedLocation>,
    loading: bool,
    error: Option<String>,
}

/// Resolves and persists the observer's position.
pub struct LocationProvider {
    store: Arc<dyn KeyValueStore>,
    positioning: Arc<dyn PositioningSource>,
    state: RwLock<LocationState>,
}

impl LocationProvider {
    pub fn new(store: Arc<dyn KeyValueStore>, positioning: Arc<dyn PositioningSource>) -> Self {
        Self {
            store,
            positioning,
            state: RwLock::new(LocationState::default()),
        }
    }

    /// Resolve the initial location.
    ///
    /// Resolution order: durable store, then a single OS fix, then the
    /// fixed default. A denied or failed fix falls back to the default
    /// with an advisory (non-fatal) error; an absent capability falls
    /// back silently.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        if let Some(raw) = self.store.get(LOCATION_KEY)? {
            match serde_json::from_str::<Coordinates>(&raw) {
                Ok(coords) => {
                    tracing::info!(
                        latitude = coords.latitude,
                        longitude = coords.longitude,
                        "restored persisted location"
                    );
                    self.state.write().current = Some(coords);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("persisted location is unreadable, ignoring: {}", e);
                }
            }
        }

        if self.positioning.is_available().await {
            self.state.write().loading = true;

            match self.positioning.current_fix().await {
                Ok(fix) => {
                    let coords = Coordinates {
                        latitude: fix.latitude,
                        longitude: fix.longitude,
                        elevation: fix.altitude,
                    };
                    self.persist_current(&coords)?;

                    let mut state = self.state.write();
                    state.current = Some(coords);
                    state.loading = false;
                }
                Err(e) => {
                    tracing::warn!("positioning failed, using default location: {}", e);

                    let mut state = self.state.write();
                    state.current = Some(Self::default_location());
                    state.loading = false;
                    state.error = Some(DEFAULT_LOCATION_NOTICE.to_string());
                }
            }
        } else {
            self.state.write().current = Some(Self::default_location());
        }

        Ok(())
    }

    /// Replace the current location and persist it.
    ///
    /// Coordinates are taken as-is; out-of-range values are accepted.
    pub fn set_location(&self, coordinates: Coordinates) -> Result<(), StorageError> {
        self.persist_current(&coordinates)?;
        self.state.write().current = Some(coordinates);
        Ok(())
    }

    /// Merge a new elevation into the current location, if one exists.
    pub fn set_elevation(&self, elevation: f64) -> Result<(), StorageError> {
        let merged = match self.state.read().current {
            Some(coords) => coords.with_elevation(elevation),
            None => return Ok(()),
        };

        self.persist_current(&merged)?;
        self.state.write().current = Some(merged);
        Ok(())
    }

    /// Append an entry to the saved list and persist the full list.
    ///
    /// Id collisions are not checked; duplicates accumulate.
    pub fn save_location(&self, entry: SavedLocation) -> Result<(), StorageError> {
        let mut state = self.state.write();
        state.saved.push(entry);
        self.persist_saved(&state.saved)
    }

    /// Remove all entries matching the id and persist the full list,
    /// even if nothing matched.
    pub fn remove_saved_location(&self, id: &str) -> Result<(), StorageError> {
        let mut state = self.state.write();
        state.saved.retain(|entry| entry.id != id);
        self.persist_saved(&state.saved)
    }

    /// Restore the saved list from the durable store if present;
    /// otherwise leave the in-memory list unchanged.
    pub fn load_saved_locations(&self) -> Result<(), StorageError> {
        let Some(raw) = self.store.get(SAVED_LOCATIONS_KEY)? else {
            return Ok(());
        };

        match serde_json::from_str::<Vec<SavedLocation>>(&raw) {
            Ok(saved) => {
                self.state.write().saved = saved;
            }
            Err(e) => {
                tracing::warn!("saved locations are unreadable, keeping in-memory list: {}", e);
            }
        }

        Ok(())
    }

    /// The current coordinates, if resolved.
    pub fn current(&self) -> Option<Coordinates> {
        self.state.read().current
    }

    /// Snapshot of the saved-location list.
    pub fn saved_locations(&self) -> Vec<SavedLocation> {
        self.state.read().saved.clone()
    }

    /// Advisory error from initialization, if any.
    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Whether a positioning request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    fn default_location() -> Coordinates {
        Coordinates::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE)
    }

    fn persist_current(&self, coords: &Coordinates) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(coords).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.store.set(LOCATION_KEY, &json)
    }

    fn persist_saved(&self, saved: &[SavedLocation]) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(saved).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.store.set(SAVED_LOCATIONS_KEY, &json)
    }
}
