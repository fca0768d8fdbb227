//! Configuration schema definitions

use crate::document::DocumentFormat;
use composer::{BuildMode, MergeOptions, Preset};
use serde::{Deserialize, Serialize};
use types::ArrayStrategy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Inputs and output of a composition run
    #[serde(default)]
    pub build: BuildConfig,
    /// Merge behavior
    #[serde(default)]
    pub merge: MergeConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Shared base configuration document
    pub base_path: Option<String>,
    /// Override documents, applied in order after the base
    #[serde(default)]
    pub overrides_paths: Vec<String>,
    /// Built-in preset applied after the override documents
    pub preset: Option<Preset>,
    /// Build mode injected into the bundle
    #[serde(default)]
    pub mode: BuildMode,
    /// Format of the merged document
    #[serde(default)]
    pub output_format: DocumentFormat,
    /// Destination file; stdout when unset
    pub output_path: Option<String>,
}

/// Merge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Merge loader rules sharing a `test` under `module.rules` and `module.loaders`
    #[serde(default)]
    pub smart: bool,
    /// Array strategies for specific paths; these win over `smart`
    #[serde(default)]
    pub rules: Vec<ArrayRuleConfig>,
}

/// Array strategy for one dotted path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayRuleConfig {
    /// Dotted path of the sequence, e.g. `module.rules`
    pub path: String,
    /// Strategy used at that path
    pub strategy: ArrayStrategy,
}

impl ArrayRuleConfig {
    /// A rule path is one or more non-empty dot-separated segments
    pub fn is_valid_path(path: &str) -> bool {
        !path.is_empty() && path.split('.').all(|segment| !segment.is_empty())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Merge options described by the configured rules
    pub fn merge_options(&self) -> MergeOptions {
        let options = MergeOptions::from_rules(
            self.merge
                .rules
                .iter()
                .map(|rule| (rule.path.clone(), rule.strategy)),
        );

        if self.merge.smart {
            options.with_smart_rules()
        } else {
            options
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            overrides_paths: Vec::new(),
            preset: None,
            mode: BuildMode::default(),
            output_format: DocumentFormat::default(),
            output_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
