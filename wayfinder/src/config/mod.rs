//! Persistent user configuration.
//!
//! Settings live in an INI file at `~/.wayfinder/config.ini`:
//!
//! ```ini
//! [provider]
//! search_url = https://nominatim.openstreetmap.org
//! routing_url = https://router.project-osrm.org
//! user_agent = wayfinder/0.1.0
//! timeout_secs = 10
//!
//! [session]
//! initial_latitude = 40.7128
//! initial_longitude = -74.006
//! initial_span = 0.1
//! default_mode = automobile
//! nearby_radius_m = 1500
//!
//! [panel]
//! height = 800
//! small_threshold = 0.15
//! large_threshold = 0.33
//! ```
//!
//! A missing file or missing keys fall back to defaults. Every key is
//! addressable as `section.key` through [`ConfigKey`].

mod keys;

pub use keys::ConfigKey;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::coord::{Coordinate, NEW_YORK_CITY};
use crate::panel::{PanelConfig, DEFAULT_LARGE_THRESHOLD, DEFAULT_PANEL_HEIGHT, DEFAULT_SMALL_THRESHOLD};
use crate::provider::{DEFAULT_ROUTING_URL, DEFAULT_SEARCH_URL, DEFAULT_USER_AGENT};
use crate::query::{QueryConfig, DEFAULT_QUERY_TIMEOUT};
use crate::routing::TransportMode;

/// Directory under the home directory holding wayfinder state.
pub const CONFIG_DIR_NAME: &str = ".wayfinder";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default radius for nearby searches, in meters.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 1_500.0;

/// Default initial map span, in degrees.
pub const DEFAULT_INITIAL_SPAN_DEG: f64 = 0.1;

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Nominatim-compatible geocoder base URL.
    pub search_url: String,
    /// OSRM-compatible router base URL.
    pub routing_url: String,
    pub user_agent: String,
    /// Per-call query timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            routing_url: DEFAULT_ROUTING_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_QUERY_TIMEOUT.as_secs(),
        }
    }
}

/// `[session]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub initial_latitude: f64,
    pub initial_longitude: f64,
    /// Initial map span in degrees, both axes.
    pub initial_span: f64,
    pub default_mode: TransportMode,
    pub nearby_radius_m: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            initial_latitude: NEW_YORK_CITY.latitude,
            initial_longitude: NEW_YORK_CITY.longitude,
            initial_span: DEFAULT_INITIAL_SPAN_DEG,
            default_mode: TransportMode::default(),
            nearby_radius_m: DEFAULT_NEARBY_RADIUS_M,
        }
    }
}

impl SessionSettings {
    pub fn initial_center(&self) -> Coordinate {
        Coordinate::new(self.initial_latitude, self.initial_longitude)
    }
}

/// `[panel]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSettings {
    pub height: f64,
    pub small_threshold: f64,
    pub large_threshold: f64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            height: DEFAULT_PANEL_HEIGHT,
            small_threshold: DEFAULT_SMALL_THRESHOLD,
            large_threshold: DEFAULT_LARGE_THRESHOLD,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub session: SessionSettings,
    pub panel: PanelSettings,
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from `path`. Unknown sections and keys are ignored.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io) => ConfigError::Io(io),
            ini::Error::Parse(parse) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: parse.to_string(),
            },
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save to the default location, creating `~/.wayfinder` if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path)?;
        tracing::debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Query settings derived from `[provider]`.
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig::default().with_timeout(Duration::from_secs(self.provider.timeout_secs))
    }

    /// Panel geometry derived from `[panel]`.
    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig::default()
            .with_height(self.panel.height)
            .with_thresholds(self.panel.small_threshold, self.panel.large_threshold)
    }
}

/// `~/.wayfinder`, or `./.wayfinder` when no home directory is known.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Full path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}
