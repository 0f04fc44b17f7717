//! Observer location for Microclimate.
//!
//! Resolves and persists the observer's geographic position, with a
//! pluggable OS positioning capability and durable-store restore.

pub mod positioning;
pub mod provider;
pub mod types;

pub use positioning::{NoPositioning, PositionFix, PositioningError, PositioningSource};
pub use provider::LocationProvider;
pub use types::{Coordinates, SavedLocation};
