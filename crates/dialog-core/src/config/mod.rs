//! Refresh manager configuration
//!
//! ```
//! use sipkit_dialog_core::config::RefreshConfig;
//!
//! let config = RefreshConfig::from_toml_str("default_expires = 600\nrefresh_margin = 20").unwrap();
//! assert_eq!(config.default_expires, 600);
//! assert_eq!(config.min_refresh_interval, 1);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{RefreshError, RefreshResult};

/// Timing of periodic refreshes. All durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Expiry assumed when neither the response nor the request grants one
    pub default_expires: u32,

    /// How long before expiry a refresh is sent
    pub refresh_margin: u32,

    /// Lower bound on any refresh delay
    pub min_refresh_interval: u32,

    /// Status reported to listeners when the transport fails
    pub transport_failure_status: u16,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            default_expires: 3600,
            refresh_margin: 30,
            min_refresh_interval: 1,
            transport_failure_status: 408,
        }
    }
}

impl RefreshConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_expires(mut self, seconds: u32) -> Self {
        self.default_expires = seconds;
        self
    }

    pub fn with_refresh_margin(mut self, seconds: u32) -> Self {
        self.refresh_margin = seconds;
        self
    }

    pub fn with_min_refresh_interval(mut self, seconds: u32) -> Self {
        self.min_refresh_interval = seconds;
        self
    }

    pub fn with_transport_failure_status(mut self, status: u16) -> Self {
        self.transport_failure_status = status;
        self
    }

    /// Parses and validates a TOML document; missing keys take defaults.
    pub fn from_toml_str(text: &str) -> RefreshResult<Self> {
        let config: RefreshConfig =
            toml::from_str(text).map_err(|e| RefreshError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RefreshResult<()> {
        if self.default_expires == 0 {
            return Err(RefreshError::Config("default_expires must be positive".into()));
        }
        if self.min_refresh_interval == 0 {
            return Err(RefreshError::Config("min_refresh_interval must be positive".into()));
        }
        if !(300..700).contains(&self.transport_failure_status) {
            return Err(RefreshError::Config(format!(
                "transport_failure_status {} is not a failure status",
                self.transport_failure_status
            )));
        }
        Ok(())
    }

    /// Delay before refreshing a grant of `expires` seconds.
    ///
    /// `expires - margin` when that leaves more than one margin of slack,
    /// otherwise half the expiry; never below `min_refresh_interval`.
    pub fn refresh_delay(&self, expires: u32) -> Duration {
        let expires = u64::from(expires);
        let margin = u64::from(self.refresh_margin);
        let seconds = if expires > 2 * margin {
            expires - margin
        } else {
            expires / 2
        };
        Duration::from_secs(seconds.max(u64::from(self.min_refresh_interval)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_delay() {
        let config = RefreshConfig::default();
        assert_eq!(config.refresh_delay(3600), Duration::from_secs(3570));
        assert_eq!(config.refresh_delay(60), Duration::from_secs(30));
        assert_eq!(config.refresh_delay(61), Duration::from_secs(31));
        assert_eq!(config.refresh_delay(1), Duration::from_secs(1));
        let config = config.with_min_refresh_interval(10);
        assert_eq!(config.refresh_delay(4), Duration::from_secs(10));
    }

    #[test]
    fn test_validation() {
        assert!(RefreshConfig::default().validate().is_ok());
        assert!(matches!(
            RefreshConfig::default().with_transport_failure_status(200).validate(),
            Err(RefreshError::Config(_))
        ));
        assert!(RefreshConfig::from_toml_str("default_expires = 0").is_err());
        assert!(RefreshConfig::from_toml_str("default_expires = \"soon\"").is_err());
    }

    #[test]
    fn test_toml_defaults_fill_missing_keys() {
        let config = RefreshConfig::from_toml_str("transport_failure_status = 503").unwrap();
        assert_eq!(config.transport_failure_status, 503);
        assert_eq!(config.default_expires, 3600);
    }
}
