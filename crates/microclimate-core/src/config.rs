use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory (also holds the durable store)
    pub config_dir: PathBuf,

    /// Base URL for the weather API
    pub api_base_url: String,

    /// URL for the live update channel
    pub channel_url: String,

    /// Sync engine settings
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Delay before the channel retries a failed connection, in seconds
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_secs: u64,

    /// Period of the fallback channel-health timer, in seconds
    #[serde(default = "default_fallback_poll_secs")]
    pub fallback_poll_secs: u64,

    /// Grid resolution requested from the API, in meters
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution_m: u32,

    /// Radius for alert queries, in meters
    #[serde(default = "default_alert_radius")]
    pub alert_radius_m: u32,

    /// Highest floor requested for vertical profiles
    #[serde(default = "default_max_floor")]
    pub max_floor: u32,
}

fn default_reconnect_secs() -> u64 {
    5
}

fn default_fallback_poll_secs() -> u64 {
    60
}

fn default_grid_resolution() -> u32 {
    100
}

fn default_alert_radius() -> u32 {
    5000
}

fn default_max_floor() -> u32 {
    100
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reconnect_secs: default_reconnect_secs(),
            fallback_poll_secs: default_fallback_poll_secs(),
            grid_resolution_m: default_grid_resolution(),
            alert_radius_m: default_alert_radius(),
            max_floor: default_max_floor(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("microclimate");

        Self {
            config_dir,
            api_base_url: "http://localhost:8000".to_string(),
            channel_url: "ws://localhost:8000/ws".to_string(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        if !validation.warnings.is_empty() {
            for warning in &validation.warnings {
                tracing::warn!("Config warning: {}", warning);
            }
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api_base_url, "api_base_url", &["http", "https"], &mut result);
        self.validate_url(&self.channel_url, "channel_url", &["ws", "wss"], &mut result);

        if self.sync.reconnect_secs == 0 {
            result.add_warning(
                "sync.reconnect_secs",
                "Reconnect delay is 0; the channel will retry immediately",
            );
        }

        if self.sync.fallback_poll_secs == 0 {
            result.add_error(
                "sync.fallback_poll_secs",
                "Fallback poll period must be greater than 0",
            );
        }

        if self.sync.grid_resolution_m == 0 {
            result.add_error("sync.grid_resolution_m", "Grid resolution must be greater than 0");
        }

        if self.sync.alert_radius_m > 100_000 {
            result.add_warning(
                "sync.alert_radius_m",
                "Alert radius is unusually large (>100km)",
            );
        }

        result
    }

    /// Validate a URL field against an allowed scheme list
    fn validate_url(
        &self,
        url_str: &str,
        field_name: &str,
        schemes: &[&str],
        result: &mut ValidationResult,
    ) {
        match Url::parse(url_str) {
            Ok(url) => {
                if !schemes.contains(&url.scheme()) {
                    result.add_error(
                        field_name,
                        format!(
                            "URL must use one of [{}], got: {}",
                            schemes.join(", "),
                            url.scheme()
                        ),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("microclimate");

        Ok(config_dir.join("config.toml"))
    }
}
