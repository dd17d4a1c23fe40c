//! Configuration for the lightning node.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default met.no lightning endpoint (UALF text).
pub const DEFAULT_API_URL: &str = "https://api.met.no/weatherapi/lightning/1.0/";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub location: LocationConfig,

    /// Home coordinates of the host, used when `location.track_home` is set
    #[serde(default)]
    pub home: Option<Coordinates>,

    /// Search radius in kilometres. Zero or less disables the feature.
    #[serde(default = "default_radius")]
    pub radius: f64,

    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Follow the host's home location instead of the coordinates above
    #[serde(default)]
    pub track_home: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_latitude() -> f64 {
    59.9139
}

fn default_longitude() -> f64 {
    10.7522
}

fn default_radius() -> f64 {
    50.0
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_user_agent() -> String {
    format!("met-lightning/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: LocationConfig::default(),
            home: None,
            radius: default_radius(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            track_home: false,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                log::info!("No config file specified, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_coordinates("location", self.location.latitude, self.location.longitude)?;

        if let Some(home) = &self.home {
            check_coordinates("home", home.latitude, home.longitude)?;
        }

        if self.location.track_home && self.home.is_none() {
            return Err(ConfigError::Invalid(
                "location.track_home is set but no home coordinates are configured".to_string(),
            ));
        }

        if !self.radius.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "radius must be finite, got {}",
                self.radius
            )));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// A radius of zero or less turns the whole feature off.
    pub fn is_enabled(&self) -> bool {
        self.radius > 0.0
    }

    /// Resolve the search origin, honouring `track_home`.
    pub fn origin(&self) -> Coordinates {
        match (self.location.track_home, self.home) {
            (true, Some(home)) => home,
            _ => Coordinates {
                latitude: self.location.latitude,
                longitude: self.location.longitude,
            },
        }
    }
}

fn check_coordinates(section: &str, latitude: f64, longitude: f64) -> Result<(), ConfigError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ConfigError::Invalid(format!(
            "{}.latitude out of range: {}",
            section, latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ConfigError::Invalid(format!(
            "{}.longitude out of range: {}",
            section, longitude
        )));
    }
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
