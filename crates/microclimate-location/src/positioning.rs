//! OS positioning capability.
//!
//! A one-shot fix request with queryable availability. Hosts without a
//! positioning service use [`NoPositioning`]; tests supply their own
//! implementations.

use async_trait::async_trait;
use thiserror::Error;

/// Positioning errors
#[derive(Debug, Error)]
pub enum PositioningError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// A single position fix from the OS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// One-shot positioning capability.
///
/// The capability owns its own timeout and denial signaling; callers
/// suspend on `current_fix` until it resolves or fails.
#[async_trait]
pub trait PositioningSource: Send + Sync {
    /// Whether a positioning service exists on this host at all.
    async fn is_available(&self) -> bool;

    /// Request a single fix.
    async fn current_fix(&self) -> Result<PositionFix, PositioningError>;
}

/// Stand-in for hosts without a positioning service.
#[derive(Debug, Default)]
pub struct NoPositioning;

#[async_trait]
impl PositioningSource for NoPositioning {
    async fn is_available(&self) -> bool {
        false
    }

    async fn current_fix(&self) -> Result<PositionFix, PositioningError> {
        Err(PositioningError::ServiceUnavailable)
    }
}
