//! Core building blocks for the Microclimate client.
//!
//! Provides configuration, the durable key-value store abstraction,
//! and tracing initialization shared by the other crates.

pub mod config;
pub mod storage;

pub use config::{Config, SyncConfig, ValidationResult};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

use anyhow::Result;

/// Initialize logging for the application.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Microclimate core initialized");
    Ok(())
}
