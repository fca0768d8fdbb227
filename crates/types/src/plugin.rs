//! Plugin descriptor types

use crate::value::{ConfigObject, ConfigValue};
use serde::Serialize;
use std::fmt;

/// Marker key identifying a mapping as a plugin descriptor
pub const PLUGIN_KEY: &str = "$plugin";

/// Key holding a plugin descriptor's options
pub const OPTIONS_KEY: &str = "options";

/// A named, opaque unit of bundler behavior with its own options
///
/// Descriptors are atomic for merging: two descriptors are never merged
/// field-by-field. On disk a descriptor is `{"$plugin": name, "options": {..}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDescriptor {
    /// Plugin name as understood by the bundler
    #[serde(rename = "$plugin")]
    pub name: String,
    /// Plugin options
    #[serde(skip_serializing_if = "ConfigObject::is_empty")]
    pub options: ConfigObject,
}

impl PluginDescriptor {
    /// Create a descriptor without options
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: ConfigObject::new(),
        }
    }

    /// Build a descriptor from a mapping carrying the `$plugin` marker
    ///
    /// The mapping may hold only the marker and an `options` mapping.
    pub fn from_mapping(mut mapping: ConfigObject) -> Result<Self, String> {
        let name = match mapping.remove(PLUGIN_KEY) {
            Some(ConfigValue::String(name)) => name,
            Some(other) => return Err(format!("{} must be a string, found {}", PLUGIN_KEY, other.kind())),
            None => return Err(format!("missing {} key", PLUGIN_KEY)),
        };

        let options = match mapping.remove(OPTIONS_KEY) {
            Some(ConfigValue::Mapping(options)) => options,
            Some(ConfigValue::Null) | None => ConfigObject::new(),
            Some(other) => {
                return Err(format!("options of plugin {} must be a mapping, found {}", name, other.kind()))
            }
        };

        if let Some(extra) = mapping.keys().next() {
            return Err(format!("unexpected key '{}' in plugin {}", extra, name));
        }

        Ok(Self { name, options })
    }

    /// Builder-style option setter
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.options.insert(key, value);
        self
    }
}

impl fmt::Display for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} options)", self.name, self.options.len())
    }
}
