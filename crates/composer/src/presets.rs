//! Built-in environment override presets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use types::utils::json_literal;
use types::{ComposerError, ConfigObject, ConfigValue, PluginDescriptor};

/// Expression the bundler substitutes with the build mode
pub const NODE_ENV_EXPRESSION: &str = "process.env.NODE_ENV";

/// Build mode injected into bundled code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
    None,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
            BuildMode::None => "none",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = ComposerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            "none" => Ok(BuildMode::None),
            other => Err(ComposerError::InvalidMode(other.to_string())),
        }
    }
}

/// Named override sets shipped with the composer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Development,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Development => "development",
        }
    }

    /// Overrides object for this preset
    pub fn overrides(&self, mode: BuildMode) -> ConfigObject {
        match self {
            Preset::Development => development_overrides(mode),
        }
    }
}

impl FromStr for Preset {
    type Err = ComposerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Preset::Development),
            other => Err(ComposerError::Config(format!("Unknown preset: {}", other))),
        }
    }
}

/// `DefinePlugin` substituting each expression with the JSON literal of its value
pub fn define_plugin<I, K, V>(defines: I) -> PluginDescriptor
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    defines
        .into_iter()
        .fold(PluginDescriptor::new("DefinePlugin"), |plugin, (expression, value)| {
            plugin.with_option(expression, json_literal(value.as_ref()))
        })
}

/// `DefinePlugin` injecting the build mode as `process.env.NODE_ENV`
pub fn node_env_define(mode: BuildMode) -> PluginDescriptor {
    define_plugin([(NODE_ENV_EXPRESSION, mode.as_str())])
}

/// `LoaderOptionsPlugin` toggling loader debug mode
pub fn loader_options_plugin(debug: bool) -> PluginDescriptor {
    PluginDescriptor::new("LoaderOptionsPlugin").with_option("debug", debug)
}

/// Development overrides: unhashed bundle names, full source maps, loader
/// debugging and the injected build mode.
pub fn development_overrides(mode: BuildMode) -> ConfigObject {
    ConfigObject::new()
        .with("output", ConfigObject::new().with("filename", "[name].js"))
        .with("devtool", "source-map")
        .with(
            "plugins",
            vec![
                ConfigValue::from(loader_options_plugin(true)),
                ConfigValue::from(node_env_define(mode)),
            ],
        )
}
