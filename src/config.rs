use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
    /// How long an analysis stays in `processing` before it is completed
    pub analysis_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            max_upload_size: 100 * 1024 * 1024, // 100MB
            analysis_delay: Duration::from_secs(3),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let bind_address = lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address);

        let max_upload_size = match lookup("MAX_UPLOAD_SIZE") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "MAX_UPLOAD_SIZE must be a byte count, got '{raw}'"
                ))
            })?,
            None => defaults.max_upload_size,
        };

        let analysis_delay = match lookup("ANALYSIS_DELAY_MS") {
            Some(raw) => raw.trim().parse().map(Duration::from_millis).map_err(|_| {
                ConfigError::ValidationError(format!(
                    "ANALYSIS_DELAY_MS must be a number of milliseconds, got '{raw}'"
                ))
            })?,
            None => defaults.analysis_delay,
        };

        let config = Config {
            bind_address,
            max_upload_size,
            analysis_delay,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "BIND_ADDRESS cannot be empty".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.analysis_delay.is_zero() {
            tracing::warn!("ANALYSIS_DELAY_MS is 0; analyses complete immediately");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert_eq!(config.max_upload_size, 100 * 1024 * 1024);
        assert_eq!(config.analysis_delay, Duration::from_secs(3));
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("MAX_UPLOAD_SIZE", "2048"),
            ("ANALYSIS_DELAY_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.max_upload_size, 2048);
        assert_eq!(config.analysis_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("MAX_UPLOAD_SIZE", "lots")]).is_err());
        assert!(load(&[("MAX_UPLOAD_SIZE", "0")]).is_err());
        assert!(load(&[("ANALYSIS_DELAY_MS", "-1")]).is_err());
        assert!(load(&[("BIND_ADDRESS", "  ")]).is_err());
    }
}
