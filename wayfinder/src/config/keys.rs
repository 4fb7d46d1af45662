//! `section.key` addressing for configuration settings.

use std::str::FromStr;

use super::{ConfigError, ConfigFile};
use crate::coord::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::routing::TransportMode;

/// A single addressable configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ProviderSearchUrl,
    ProviderRoutingUrl,
    ProviderUserAgent,
    ProviderTimeoutSecs,
    SessionInitialLatitude,
    SessionInitialLongitude,
    SessionInitialSpan,
    SessionDefaultMode,
    SessionNearbyRadius,
    PanelHeight,
    PanelSmallThreshold,
    PanelLargeThreshold,
}

const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::ProviderSearchUrl,
    ConfigKey::ProviderRoutingUrl,
    ConfigKey::ProviderUserAgent,
    ConfigKey::ProviderTimeoutSecs,
    ConfigKey::SessionInitialLatitude,
    ConfigKey::SessionInitialLongitude,
    ConfigKey::SessionInitialSpan,
    ConfigKey::SessionDefaultMode,
    ConfigKey::SessionNearbyRadius,
    ConfigKey::PanelHeight,
    ConfigKey::PanelSmallThreshold,
    ConfigKey::PanelLargeThreshold,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        ALL_KEYS
    }

    /// INI section name.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ProviderSearchUrl
            | ConfigKey::ProviderRoutingUrl
            | ConfigKey::ProviderUserAgent
            | ConfigKey::ProviderTimeoutSecs => "provider",
            ConfigKey::SessionInitialLatitude
            | ConfigKey::SessionInitialLongitude
            | ConfigKey::SessionInitialSpan
            | ConfigKey::SessionDefaultMode
            | ConfigKey::SessionNearbyRadius => "session",
            ConfigKey::PanelHeight
            | ConfigKey::PanelSmallThreshold
            | ConfigKey::PanelLargeThreshold => "panel",
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::ProviderSearchUrl => "search_url",
            ConfigKey::ProviderRoutingUrl => "routing_url",
            ConfigKey::ProviderUserAgent => "user_agent",
            ConfigKey::ProviderTimeoutSecs => "timeout_secs",
            ConfigKey::SessionInitialLatitude => "initial_latitude",
            ConfigKey::SessionInitialLongitude => "initial_longitude",
            ConfigKey::SessionInitialSpan => "initial_span",
            ConfigKey::SessionDefaultMode => "default_mode",
            ConfigKey::SessionNearbyRadius => "nearby_radius_m",
            ConfigKey::PanelHeight => "height",
            ConfigKey::PanelSmallThreshold => "small_threshold",
            ConfigKey::PanelLargeThreshold => "large_threshold",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ProviderSearchUrl => config.provider.search_url.clone(),
            ConfigKey::ProviderRoutingUrl => config.provider.routing_url.clone(),
            ConfigKey::ProviderUserAgent => config.provider.user_agent.clone(),
            ConfigKey::ProviderTimeoutSecs => config.provider.timeout_secs.to_string(),
            ConfigKey::SessionInitialLatitude => config.session.initial_latitude.to_string(),
            ConfigKey::SessionInitialLongitude => config.session.initial_longitude.to_string(),
            ConfigKey::SessionInitialSpan => config.session.initial_span.to_string(),
            ConfigKey::SessionDefaultMode => config.session.default_mode.to_string(),
            ConfigKey::SessionNearbyRadius => config.session.nearby_radius_m.to_string(),
            ConfigKey::PanelHeight => config.panel.height.to_string(),
            ConfigKey::PanelSmallThreshold => config.panel.small_threshold.to_string(),
            ConfigKey::PanelLargeThreshold => config.panel.large_threshold.to_string(),
        }
    }

    /// Parse, validate and store `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::ProviderSearchUrl => config.provider.search_url = self.url(value)?,
            ConfigKey::ProviderRoutingUrl => config.provider.routing_url = self.url(value)?,
            ConfigKey::ProviderUserAgent => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.provider.user_agent = value.to_string();
            }
            ConfigKey::ProviderTimeoutSecs => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| self.invalid(value, "expected whole seconds"))?;
                if secs == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                config.provider.timeout_secs = secs;
            }
            ConfigKey::SessionInitialLatitude => {
                config.session.initial_latitude = self.number_in(value, MIN_LAT, MAX_LAT)?
            }
            ConfigKey::SessionInitialLongitude => {
                config.session.initial_longitude = self.number_in(value, MIN_LON, MAX_LON)?
            }
            ConfigKey::SessionInitialSpan => {
                config.session.initial_span = self.positive(value)?.min(180.0)
            }
            ConfigKey::SessionDefaultMode => {
                config.session.default_mode = value
                    .parse::<TransportMode>()
                    .map_err(|e| self.invalid(value, &e))?
            }
            ConfigKey::SessionNearbyRadius => config.session.nearby_radius_m = self.positive(value)?,
            ConfigKey::PanelHeight => config.panel.height = self.positive(value)?,
            ConfigKey::PanelSmallThreshold => {
                config.panel.small_threshold = self.fraction(value)?
            }
            ConfigKey::PanelLargeThreshold => {
                config.panel.large_threshold = self.fraction(value)?
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn url(&self, value: &str) -> Result<String, ConfigError> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(value.trim_end_matches('/').to_string())
        } else {
            Err(self.invalid(value, "expected an http:// or https:// URL"))
        }
    }

    fn number(&self, value: &str) -> Result<f64, ConfigError> {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.invalid(value, "expected a number"))
    }

    fn number_in(&self, value: &str, min: f64, max: f64) -> Result<f64, ConfigError> {
        let number = self.number(value)?;
        if !(min..=max).contains(&number) {
            return Err(self.invalid(value, &format!("must be between {} and {}", min, max)));
        }
        Ok(number)
    }

    fn positive(&self, value: &str) -> Result<f64, ConfigError> {
        let number = self.number(value)?;
        if number <= 0.0 {
            return Err(self.invalid(value, "must be positive"));
        }
        Ok(number)
    }

    fn fraction(&self, value: &str) -> Result<f64, ConfigError> {
        let number = self.number(value)?;
        if !(number > 0.0 && number < 1.0) {
            return Err(self.invalid(value, "must be between 0 and 1 (exclusive)"));
        }
        Ok(number)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
