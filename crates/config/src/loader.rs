//! Configuration loader implementation

use crate::schema::{ArrayRuleConfig, Config};
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use types::{ComposerError, ConfigError};

/// Prefix of environment variables overriding settings, e.g. `CONFIG_COMPOSER_BUILD__MODE`
pub const ENV_PREFIX: &str = "CONFIG_COMPOSER_";

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config = Self::load_unchecked(config_path.as_ref())?;
        Self::validate(&config)?;
        debug!(path = %config_path.as_ref().display(), "Loaded composer settings");
        Ok(config)
    }

    /// Load configuration from file and environment variables without validating it
    ///
    /// Used when every problem should be reported rather than the first one.
    pub fn load_unchecked<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        // Check if config file exists
        if !config_path.exists() {
            return Err(ComposerError::Config(format!(
                "Configuration file not found: {}",
                config_path.display()
            ))
            .into());
        }

        let config: Config = Self::figment()
            .merge(Yaml::file(config_path))
            .merge(Self::env_providers())
            .extract()
            .context("Failed to parse configuration")?;

        Ok(config)
    }

    /// Load configuration from environment variables only, when no file is given
    pub fn load_from_env() -> Result<Config> {
        let config = Self::load_from_env_unchecked()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables without validating it
    pub fn load_from_env_unchecked() -> Result<Config> {
        Self::figment()
            .merge(Self::env_providers())
            .extract()
            .context("Failed to parse configuration from environment")
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> Result<Config> {
        let config: Config = Self::figment()
            .merge(Yaml::string(yaml_content))
            .extract()
            .context("Failed to parse configuration from string")?;

        Self::validate(&config)?;
        Ok(config)
    }

    // Every field has a serde default, so an empty figment extracts the defaults
    fn figment() -> Figment {
        Figment::new()
    }

    fn env_providers() -> Figment {
        Figment::new()
            // Nested keys use a double underscore: CONFIG_COMPOSER_LOGGING__LEVEL
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            // LOG_FORMAT is shared with the logging initialization
            .merge(Env::raw().only(&["LOG_FORMAT"]).map(|_| "logging.format".into()))
    }

    /// Validate configuration, failing on the first problem
    pub fn validate(config: &Config) -> Result<()> {
        // Validate build paths
        if let Some(ref base_path) = config.build.base_path {
            if base_path.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    field: "build.base_path".to_string(),
                    message: "Base path cannot be empty".to_string(),
                }
                .into());
            }
        }

        if config.build.overrides_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                field: "build.overrides_paths".to_string(),
                message: "Override paths cannot be empty".to_string(),
            }
            .into());
        }

        if let Some(ref output_path) = config.build.output_path {
            if output_path.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    field: "build.output_path".to_string(),
                    message: "Output path cannot be empty".to_string(),
                }
                .into());
            }
        }

        // Validate merge rules
        let mut seen = HashSet::new();
        for rule in &config.merge.rules {
            if !ArrayRuleConfig::is_valid_path(&rule.path) {
                return Err(ConfigError::InvalidValue {
                    field: "merge.rules.path".to_string(),
                    value: rule.path.clone(),
                }
                .into());
            }

            if !seen.insert(rule.path.as_str()) {
                return Err(ConfigError::ValidationError {
                    field: "merge.rules".to_string(),
                    message: format!("Duplicate rule for path {}", rule.path),
                }
                .into());
            }
        }

        // Validate logging configuration
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level: {}. Valid levels: {:?}",
                    config.logging.level, valid_log_levels
                ),
            }
            .into());
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.format".to_string(),
                message: format!(
                    "Invalid log format: {}. Valid formats: {:?}",
                    config.logging.format, valid_log_formats
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Get default configuration
    pub fn default() -> Config {
        Config::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let mut config = Self::default();
        config.build.base_path = Some("webpack.common.yaml".to_string());
        config.build.preset = Some(composer::Preset::Development);
        config.merge.smart = true;
        config.merge.rules.push(ArrayRuleConfig {
            path: "plugins".to_string(),
            strategy: types::ArrayStrategy::UniquePlugins,
        });

        let yaml_content = serde_yaml::to_string(&config)
            .context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}
